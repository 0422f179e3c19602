use std::convert::TryFrom;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{named_params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};

use crate::error::AppResult;

/// Stable storage key for a cache key (base64 encoded SHA-256).
pub fn storage_key(cache_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cache_key.as_bytes());
    STANDARD_NO_PAD.encode(hasher.finalize())
}

fn namespace_of(cache_key: &str) -> &str {
    cache_key
        .split_once(':')
        .map(|(namespace, _)| namespace)
        .unwrap_or(cache_key)
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone)]
pub struct CacheEntryRow {
    pub cache_key: String,
    pub namespace: String,
    pub payload: Vec<u8>,
    pub created_at: String,
    pub expires_at: String,
    pub hit_count: i64,
}

impl TryFrom<&Row<'_>> for CacheEntryRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            cache_key: row.get("cache_key")?,
            namespace: row.get("namespace")?,
            payload: row.get("payload")?,
            created_at: row.get("created_at")?,
            expires_at: row.get("expires_at")?,
            hit_count: row.get("hit_count")?,
        })
    }
}

pub struct CacheRepository;

impl CacheRepository {
    pub fn upsert(
        conn: &Connection,
        cache_key: &str,
        payload: &[u8],
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO result_cache (
                    storage_key,
                    cache_key,
                    namespace,
                    payload,
                    created_at,
                    expires_at,
                    hit_count
                ) VALUES (
                    :storage_key,
                    :cache_key,
                    :namespace,
                    :payload,
                    :created_at,
                    :expires_at,
                    0
                )
                ON CONFLICT(storage_key) DO UPDATE SET
                    payload = excluded.payload,
                    created_at = excluded.created_at,
                    expires_at = excluded.expires_at,
                    hit_count = 0
            "#,
            named_params! {
                ":storage_key": storage_key(cache_key),
                ":cache_key": cache_key,
                ":namespace": namespace_of(cache_key),
                ":payload": payload,
                ":created_at": timestamp(&now),
                ":expires_at": timestamp(&expires_at),
            },
        )?;

        Ok(())
    }

    /// Live entry for `cache_key`; a hit bumps its counter.
    pub fn find_live(
        conn: &Connection,
        cache_key: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<CacheEntryRow>> {
        let key = storage_key(cache_key);
        let row = conn
            .query_row(
                r#"
                    SELECT cache_key, namespace, payload, created_at, expires_at, hit_count
                    FROM result_cache
                    WHERE storage_key = :storage_key AND expires_at > :now
                "#,
                named_params! {":storage_key": &key, ":now": timestamp(&now)},
                |row| CacheEntryRow::try_from(row),
            )
            .optional()?;

        if row.is_some() {
            conn.execute(
                "UPDATE result_cache SET hit_count = hit_count + 1 WHERE storage_key = :storage_key",
                named_params! {":storage_key": &key},
            )?;
        }

        Ok(row)
    }

    pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> AppResult<usize> {
        let deleted = conn.execute(
            "DELETE FROM result_cache WHERE expires_at <= :now",
            named_params! {":now": timestamp(&now)},
        )?;
        Ok(deleted)
    }

    pub fn count_in_namespace(conn: &Connection, namespace: &str) -> AppResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM result_cache WHERE namespace = :namespace",
            named_params! {":namespace": namespace},
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
