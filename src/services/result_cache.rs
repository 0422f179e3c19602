use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::settings::EngineSettings;

/// Best-effort key/value store for optimization side data.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()>;
}

/// Runs one cache call bounded by `limit`; running out of time is reported
/// as a cache error.
pub async fn bounded<T, F>(limit: Duration, operation: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(AppError::cache(format!(
            "cache call timed out after {} ms",
            limit.as_millis()
        ))),
    }
}

/// Supported cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    SchedulingResult,
    ProductivityPatterns,
}

impl CacheNamespace {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheNamespace::SchedulingResult => "scheduling_result",
            CacheNamespace::ProductivityPatterns => "productivity_patterns",
        }
    }
}

/// Cache identity constructed from namespace + subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    namespace: CacheNamespace,
    subject: String,
}

impl CacheKey {
    /// Key for a participant set; order and duplicates do not matter.
    pub fn scheduling_result(participants: &[String]) -> Self {
        let mut ids: Vec<&str> = participants.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids.dedup();
        Self {
            namespace: CacheNamespace::SchedulingResult,
            subject: ids.join(":"),
        }
    }

    pub fn productivity_patterns(participant: &str) -> Self {
        Self {
            namespace: CacheNamespace::ProductivityPatterns,
            subject: participant.to_string(),
        }
    }

    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.namespace.as_str(), self.subject)
    }
}

impl From<&CacheKey> for String {
    fn from(value: &CacheKey) -> Self {
        value.cache_key()
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Bounded in-process cache with per-entry expiry.
pub struct MemoryResultCache {
    entries: Mutex<LruCache<String, MemoryEntry>>,
}

impl MemoryResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.memory_cache_capacity)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| AppError::cache("memory cache lock poisoned"))?;

        let expired = match guard.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!(target: "app::cache", cache_key = %key, "memory cache hit");
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            guard.pop(key);
            debug!(target: "app::cache", cache_key = %key, "evicted expired entry");
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| AppError::cache("cache ttl out of range"))?;
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| AppError::cache("memory cache lock poisoned"))?;
        guard.put(key.to_string(), MemoryEntry { value, expires_at });
        Ok(())
    }
}
