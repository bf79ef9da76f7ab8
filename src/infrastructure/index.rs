//! Embedding index over the backing store

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::store::KeyValueStore;
use crate::domain::{
    cosine_similarity, CacheError, EmbeddingEntry, Fingerprint, EMBEDDING_KEY_PREFIX,
};

/// Best similarity match found by the index
#[derive(Debug, Clone)]
pub struct IndexMatch {
    /// Fingerprint of the paired cache entry
    pub fingerprint: Fingerprint,
    /// Cosine similarity of the stored prompt against the query
    pub similarity: f32,
    /// The stored prompt that matched
    pub matched_prompt: String,
}

/// Stores prompt embeddings and answers nearest-prompt queries per model
///
/// Lookup is a linear cosine scan over the embedding prefix. Entries for
/// other models never participate in a search, and a payload that fails to
/// parse is skipped rather than aborting the scan.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    store: Arc<dyn KeyValueStore>,
}

impl EmbeddingIndex {
    /// Create an index over the given backing store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store an embedding entry, overwriting any entry for the same slot
    pub async fn insert(&self, entry: &EmbeddingEntry, ttl: Duration) -> Result<(), CacheError> {
        let payload = serde_json::to_string(entry).map_err(|e| {
            CacheError::serialization(format!("Failed to serialize embedding entry: {}", e))
        })?;

        self.store
            .set_raw(&entry.fingerprint().embedding_key(), &payload, ttl)
            .await
    }

    /// Find the most similar stored prompt for a model at or above threshold
    ///
    /// Runs a strictly-greater running maximum over the scan, so when two
    /// entries tie at the top similarity the first one encountered wins
    /// (scan order is store-defined).
    pub async fn find_best_match(
        &self,
        query: &[f32],
        model: &str,
        threshold: f32,
    ) -> Result<Option<IndexMatch>, CacheError> {
        let keys = self.store.scan_keys(EMBEDDING_KEY_PREFIX).await?;

        debug!(
            "Searching {} embedding candidates for model '{}' at threshold {:.2}",
            keys.len(),
            model,
            threshold
        );

        let mut best: Option<IndexMatch> = None;

        for key in keys {
            let Some(payload) = self.store.get_raw(&key).await? else {
                continue;
            };

            let entry: EmbeddingEntry = match serde_json::from_str(&payload) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping malformed embedding entry '{}': {}", key, e);
                    continue;
                }
            };

            if entry.is_expired() || entry.model() != model {
                continue;
            }

            let similarity = cosine_similarity(query, entry.embedding());

            if similarity < threshold {
                continue;
            }

            if best.as_ref().is_none_or(|b| similarity > b.similarity) {
                best = Some(IndexMatch {
                    fingerprint: entry.fingerprint().clone(),
                    similarity,
                    matched_prompt: entry.prompt_text().to_string(),
                });
            }
        }

        Ok(best)
    }

    /// Delete all embedding entries for a model, returning the count
    pub async fn delete_by_model(&self, model: &str) -> Result<usize, CacheError> {
        let keys = self.store.scan_keys(EMBEDDING_KEY_PREFIX).await?;
        let mut deleted = 0;

        for key in keys {
            let Some(payload) = self.store.get_raw(&key).await? else {
                continue;
            };

            match serde_json::from_str::<EmbeddingEntry>(&payload) {
                Ok(entry) if entry.model() == model => {
                    if self.store.delete(&key).await? {
                        deleted += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Dropping malformed embedding entry '{}': {}", key, e);
                    self.store.delete(&key).await?;
                }
            }
        }

        Ok(deleted)
    }

    /// Delete every embedding entry
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let keys = self.store.scan_keys(EMBEDDING_KEY_PREFIX).await?;
        let mut deleted = 0;

        for key in keys {
            if self.store.delete(&key).await? {
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}
