//! In-memory store implementation using moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::store::KeyValueStore;
use crate::domain::CacheError;

/// Payload stored in moka
#[derive(Debug, Clone)]
struct StoredValue {
    /// Serialized JSON payload
    data: String,
    /// Expiration timestamp (millis since epoch)
    expires_at: u64,
}

/// Thread-safe in-memory key-value store
///
/// Backs the cache in development and in every unit test. TTL is tracked
/// per entry and enforced at read time; moka additionally evicts when
/// capacity is reached.
#[derive(Debug)]
pub struct InMemoryStore {
    cache: MokaCache<String, StoredValue>,
}

impl InMemoryStore {
    /// Create a new in-memory store with the given capacity
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: MokaCache::builder().max_capacity(max_capacity).build(),
        }
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn is_expired(value: &StoredValue) -> bool {
        Self::current_time_millis() >= value.expires_at
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.cache.get(key).await {
            Some(value) => {
                if Self::is_expired(&value) {
                    self.cache.remove(key).await;
                    Ok(None)
                } else {
                    Ok(Some(value.data))
                }
            }
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let stored = StoredValue {
            data: value.to_string(),
            expires_at: Self::current_time_millis() + ttl.as_millis() as u64,
        };

        self.cache.insert(key.to_string(), stored).await;

        Ok(())
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let keys = self
            .cache
            .iter()
            .filter(|(key, value)| key.starts_with(prefix) && !Self::is_expired(value))
            .map(|(key, _)| key.to_string())
            .collect();

        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.cache.remove(key).await.is_some())
    }
}
