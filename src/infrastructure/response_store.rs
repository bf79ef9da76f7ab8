//! Response store over the backing store

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::store::KeyValueStore;
use crate::domain::{CacheError, CacheEntry, Fingerprint, RESPONSE_KEY_PREFIX};

/// Stores finalized response text by fingerprint with TTL expiry
///
/// A miss and an expired entry are indistinguishable to callers; both come
/// back as `None`. A payload that fails to parse is also reported as a
/// miss after a warning, never as an error.
#[derive(Debug, Clone)]
pub struct ResponseStore {
    store: Arc<dyn KeyValueStore>,
}

impl ResponseStore {
    /// Create a response store over the given backing store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store a response entry, overwriting any entry for the same slot
    pub async fn put(&self, entry: &CacheEntry, ttl: Duration) -> Result<(), CacheError> {
        let payload = serde_json::to_string(entry).map_err(|e| {
            CacheError::serialization(format!("Failed to serialize cache entry: {}", e))
        })?;

        self.store
            .set_raw(&entry.fingerprint().response_key(), &payload, ttl)
            .await
    }

    /// Fetch the live response entry for a fingerprint
    pub async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let key = fingerprint.response_key();

        let Some(payload) = self.store.get_raw(&key).await? else {
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_str(&payload) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Treating malformed response entry '{}' as a miss: {}", key, e);
                return Ok(None);
            }
        };

        if entry.is_expired() {
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Delete all response entries for a model, returning the count
    pub async fn delete_by_model(&self, model: &str) -> Result<usize, CacheError> {
        let keys = self.store.scan_keys(RESPONSE_KEY_PREFIX).await?;
        let mut deleted = 0;

        for key in keys {
            let Some(payload) = self.store.get_raw(&key).await? else {
                continue;
            };

            match serde_json::from_str::<CacheEntry>(&payload) {
                Ok(entry) if entry.model() == model => {
                    if self.store.delete(&key).await? {
                        deleted += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Dropping malformed response entry '{}': {}", key, e);
                    self.store.delete(&key).await?;
                }
            }
        }

        Ok(deleted)
    }

    /// Delete every response entry
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let keys = self.store.scan_keys(RESPONSE_KEY_PREFIX).await?;
        let mut deleted = 0;

        for key in keys {
            if self.store.delete(&key).await? {
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}
