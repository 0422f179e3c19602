use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::task;
use tracing::debug;

use crate::db::repositories::cache_repository::CacheRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::result_cache::ResultCache;

/// Result cache persisted in the `result_cache` table.
#[derive(Debug, Clone)]
pub struct SqliteResultCache {
    db: Arc<DbPool>,
}

impl SqliteResultCache {
    pub fn new(db: DbPool) -> Self {
        Self { db: Arc::new(db) }
    }

    pub async fn purge_expired(&self) -> AppResult<usize> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            db.with_connection(|conn| {
                let deleted = CacheRepository::purge_expired(conn, Utc::now())?;
                if deleted > 0 {
                    debug!(target: "app::cache", deleted, "purged expired cache entries");
                }
                Ok(deleted)
            })
        })
        .await
        .map_err(|err| AppError::cache(format!("cache purge task failed: {err}")))?
    }
}

#[async_trait]
impl ResultCache for SqliteResultCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let db = Arc::clone(&self.db);
        let cache_key = key.to_string();

        task::spawn_blocking(move || {
            db.with_connection(|conn| {
                let entry = CacheRepository::find_live(conn, &cache_key, Utc::now())?;
                if let Some(entry) = &entry {
                    debug!(
                        target: "app::cache",
                        cache_key = %cache_key,
                        namespace = %entry.namespace,
                        hits = entry.hit_count + 1,
                        "cache hit"
                    );
                }
                Ok(entry.map(|entry| entry.payload))
            })
        })
        .await
        .map_err(|err| AppError::cache(format!("cache lookup task failed: {err}")))?
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: StdDuration) -> AppResult<()> {
        let db = Arc::clone(&self.db);
        let cache_key = key.to_string();
        let ttl = Duration::from_std(ttl)
            .map_err(|err| AppError::cache(format!("cache ttl out of range: {err}")))?;

        task::spawn_blocking(move || {
            db.with_connection(|conn| {
                let now = Utc::now();
                let expires_at = now
                    .checked_add_signed(ttl)
                    .ok_or_else(|| AppError::cache("cache ttl out of range"))?;
                CacheRepository::upsert(conn, &cache_key, &value, now, expires_at)?;
                debug!(target: "app::cache", cache_key = %cache_key, "cache entry stored");
                Ok(())
            })
        })
        .await
        .map_err(|err| AppError::cache(format!("cache write task failed: {err}")))?
    }
}
