//! Backing key-value store seam

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::CacheError;

/// Key-value store trait backing both cache stores
///
/// The Embedding Index and the Response Store share one backing store and
/// stay disjoint through their key prefixes. Payloads are JSON strings so
/// entries survive a restart with their structure intact.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Gets a raw JSON payload by key, `None` on absent or expired
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Sets a raw JSON payload with an expiry
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Lists all live keys starting with the given prefix
    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    /// Deletes a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Store that fails every operation, simulating a backing-store outage
    #[derive(Debug, Default)]
    pub struct FailingStore;

    impl FailingStore {
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::store(format!(
                "simulated outage getting '{}'",
                key
            )))
        }

        async fn set_raw(
            &self,
            key: &str,
            _value: &str,
            _ttl: Duration,
        ) -> Result<(), CacheError> {
            Err(CacheError::store(format!(
                "simulated outage setting '{}'",
                key
            )))
        }

        async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
            Err(CacheError::store(format!(
                "simulated outage scanning '{}'",
                prefix
            )))
        }

        async fn delete(&self, key: &str) -> Result<bool, CacheError> {
            Err(CacheError::store(format!(
                "simulated outage deleting '{}'",
                key
            )))
        }
    }
}

#[cfg(test)]
pub use mock::FailingStore;
