//! Semantic cache coordinator
//!
//! Single entry point tying the validator, embedding index, and response
//! store together. No error from any collaborator ever reaches the caller:
//! lookup degrades to a miss and populate to a skipped write, so the worst
//! case is a cold cache, never a failed request.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::store::KeyValueStore;
use crate::domain::{
    is_cacheable, CacheEntry, CacheError, EmbeddingEntry, EmbeddingProvider, Fingerprint,
    SemanticCacheConfig,
};
use crate::infrastructure::index::EmbeddingIndex;
use crate::infrastructure::response_store::ResponseStore;

/// A successful cache lookup
#[derive(Debug, Clone)]
pub struct CacheHit {
    /// The cached response text
    pub response: String,
    /// Similarity of the matched prompt against the query prompt
    pub similarity: f32,
    /// The stored prompt the query matched against
    pub matched_prompt: String,
    /// Cache slot the response came from
    pub fingerprint: Fingerprint,
}

/// Outcome of a populate call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// Both stores were written
    Stored,
    /// The response failed validation and was not written anywhere
    SkippedInvalid,
    /// The cache is disabled by configuration
    SkippedDisabled,
    /// A store or embedding failure prevented the write
    Failed,
}

/// Cache hit/miss counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;

        if total == 0 {
            return 0.0;
        }

        self.hits as f32 / total as f32
    }
}

/// Coordinator for semantic response caching
///
/// Holds its collaborators explicitly (no process-global state): the two
/// stores over one backing key-value store, the embedding provider, and
/// the deployment configuration.
#[derive(Debug)]
pub struct SemanticCacheService {
    index: EmbeddingIndex,
    responses: ResponseStore,
    embedder: Arc<dyn EmbeddingProvider>,
    config: SemanticCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SemanticCacheService {
    /// Create a new service with default configuration
    pub fn new(store: Arc<dyn KeyValueStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_config(store, embedder, SemanticCacheConfig::default())
    }

    /// Create a new service with custom configuration
    pub fn with_config(
        store: Arc<dyn KeyValueStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: SemanticCacheConfig,
    ) -> Self {
        Self {
            index: EmbeddingIndex::new(store.clone()),
            responses: ResponseStore::new(store),
            embedder,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    /// Apply the store-call timeout to a fallible operation
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.config.store_timeout(), operation).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::timeout(format!(
                "operation exceeded {}s",
                self.config.store_timeout_secs
            ))),
        }
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Look up a cached response for a semantically similar prompt
    ///
    /// Returns `None` on any miss, including store outages, embedding
    /// failures, and timeouts; this method cannot fail.
    pub async fn lookup(&self, prompt: &str, model: &str) -> Option<CacheHit> {
        if !self.config.enabled {
            return None;
        }

        let query = match self.bounded(self.embedder.embed(prompt)).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Failed to generate embedding for cache lookup: {}", e);
                self.record_miss();
                return None;
            }
        };

        let matched = match self
            .bounded(
                self.index
                    .find_best_match(&query, model, self.config.similarity_threshold),
            )
            .await
        {
            Ok(Some(matched)) => matched,
            Ok(None) => {
                debug!("Semantic cache miss for model '{}'", model);
                self.record_miss();
                return None;
            }
            Err(e) => {
                warn!("Embedding index search failed, treating as miss: {}", e);
                self.record_miss();
                return None;
            }
        };

        let entry = match self.bounded(self.responses.get(&matched.fingerprint)).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                // Index hit whose paired response already expired
                debug!(
                    "Index match {} had no live response, treating as miss",
                    matched.fingerprint
                );
                self.record_miss();
                return None;
            }
            Err(e) => {
                warn!("Response fetch failed, treating as miss: {}", e);
                self.record_miss();
                return None;
            }
        };

        self.hits.fetch_add(1, Ordering::Relaxed);

        debug!(
            "Semantic cache hit with similarity {:.4} (matched prompt: '{}')",
            matched.similarity, matched.matched_prompt
        );

        Some(CacheHit {
            response: entry.response_text().to_string(),
            similarity: matched.similarity,
            matched_prompt: matched.matched_prompt,
            fingerprint: matched.fingerprint,
        })
    }

    /// Cache a response for a prompt, best-effort
    ///
    /// The validator runs first; rejected text never reaches either store.
    /// The response store is always written before the embedding index, so
    /// a reader can never resolve an index hit to a not-yet-written
    /// response. Repeated populates for the same slot overwrite.
    pub async fn populate(&self, prompt: &str, model: &str, response: &str) -> PopulateOutcome {
        if !self.config.enabled {
            return PopulateOutcome::SkippedDisabled;
        }

        if !is_cacheable(response) {
            debug!("Populate skipped: invalid response for model '{}'", model);
            return PopulateOutcome::SkippedInvalid;
        }

        let embedding = match self.bounded(self.embedder.embed(prompt)).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Failed to generate embedding for caching: {}", e);
                return PopulateOutcome::Failed;
            }
        };

        let fingerprint = Fingerprint::compute(prompt, model);
        let ttl = self.config.ttl();

        let cache_entry = CacheEntry::new(fingerprint.clone(), response, model, ttl);
        let embedding_entry =
            EmbeddingEntry::new(prompt, embedding, model, fingerprint.clone(), ttl);

        if let Err(e) = self.bounded(self.responses.put(&cache_entry, ttl)).await {
            warn!("Response store write failed for {}: {}", fingerprint, e);
            return PopulateOutcome::Failed;
        }

        if let Err(e) = self.bounded(self.index.insert(&embedding_entry, ttl)).await {
            // Response without an index entry is unreachable and ages
            // out with the TTL; never the other way around.
            warn!("Embedding index write failed for {}: {}", fingerprint, e);
            return PopulateOutcome::Failed;
        }

        debug!("Cached response {} for model '{}'", fingerprint, model);

        PopulateOutcome::Stored
    }

    /// Remove all entries for a model from both stores, best-effort
    ///
    /// Returns the number of cache slots removed.
    pub async fn invalidate_model(&self, model: &str) -> usize {
        let removed = match self.bounded(self.responses.delete_by_model(model)).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Response invalidation failed for model '{}': {}", model, e);
                0
            }
        };

        if let Err(e) = self.bounded(self.index.delete_by_model(model)).await {
            warn!("Embedding invalidation failed for model '{}': {}", model, e);
        }

        removed
    }

    /// Remove every entry from both stores, best-effort
    pub async fn clear(&self) {
        if let Err(e) = self.bounded(self.responses.clear()).await {
            warn!("Response store clear failed: {}", e);
        }

        if let Err(e) = self.bounded(self.index.clear()).await {
            warn!("Embedding index clear failed: {}", e);
        }

        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Get hit/miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{FailingStore, MockEmbeddingProvider, EMBEDDING_KEY_PREFIX};
    use crate::infrastructure::store::InMemoryStore;

    /// Store that fails writes under a chosen key prefix but otherwise
    /// delegates, for exercising partial write failures.
    #[derive(Debug)]
    struct PrefixFailingStore {
        inner: InMemoryStore,
        failing_prefix: &'static str,
    }

    impl PrefixFailingStore {
        fn new(failing_prefix: &'static str) -> Self {
            Self {
                inner: InMemoryStore::new(100),
                failing_prefix,
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for PrefixFailingStore {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.inner.get_raw(key).await
        }

        async fn set_raw(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> Result<(), CacheError> {
            if key.starts_with(self.failing_prefix) {
                return Err(CacheError::store("simulated write failure"));
            }
            self.inner.set_raw(key, value, ttl).await
        }

        async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
            self.inner.scan_keys(prefix).await
        }

        async fn delete(&self, key: &str) -> Result<bool, CacheError> {
            self.inner.delete(key).await
        }
    }

    fn service() -> SemanticCacheService {
        service_with(Arc::new(InMemoryStore::new(100)), MockEmbeddingProvider::new("mock", 64))
    }

    fn service_with(
        store: Arc<dyn KeyValueStore>,
        embedder: MockEmbeddingProvider,
    ) -> SemanticCacheService {
        SemanticCacheService::with_config(
            store,
            Arc::new(embedder),
            SemanticCacheConfig::new().with_similarity_threshold(0.85),
        )
    }

    #[tokio::test]
    async fn test_round_trip_hit() {
        let service = service();

        let outcome = service
            .populate("Qual a capital do Brasil?", "m", "Brasília, desde 1960.")
            .await;
        assert_eq!(outcome, PopulateOutcome::Stored);

        let hit = service
            .lookup("Qual a capital do Brasil?", "m")
            .await
            .unwrap();

        assert_eq!(hit.response, "Brasília, desde 1960.");
        assert_eq!(hit.matched_prompt, "Qual a capital do Brasil?");
        assert!((hit.similarity - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_cold_cache_misses() {
        let service = service();

        assert!(service.lookup("anything at all", "m").await.is_none());
    }

    #[tokio::test]
    async fn test_error_response_never_persists() {
        let service = service();

        let outcome = service
            .populate(
                "Qual a capital do Brasil?",
                "m",
                "Timeout na requisição após 30 segundos",
            )
            .await;

        assert_eq!(outcome, PopulateOutcome::SkippedInvalid);
        assert!(service
            .lookup("Qual a capital do Brasil?", "m")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_short_response_never_persists() {
        let service = service();

        let outcome = service.populate("prompt", "m", "ok").await;

        assert_eq!(outcome, PopulateOutcome::SkippedInvalid);
        assert!(service.lookup("prompt", "m").await.is_none());
    }

    #[tokio::test]
    async fn test_no_cross_model_hit() {
        let service = service();

        service
            .populate("Qual a capital do Brasil?", "model-a", "Brasília, desde 1960.")
            .await;

        assert!(service
            .lookup("Qual a capital do Brasil?", "model-b")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_paraphrase_above_threshold_hits() {
        let embedder = MockEmbeddingProvider::new("mock", 2)
            .with_vector("O que são fundos imobiliários?", vec![1.0, 0.0])
            .with_vector("Me explique fundos imobiliários", vec![0.95, 0.05]);
        let service = service_with(Arc::new(InMemoryStore::new(100)), embedder);

        service
            .populate(
                "O que são fundos imobiliários?",
                "m",
                "Fundos imobiliários são veículos de investimento coletivo.",
            )
            .await;

        let hit = service
            .lookup("Me explique fundos imobiliários", "m")
            .await
            .unwrap();

        assert_eq!(hit.matched_prompt, "O que são fundos imobiliários?");
        assert!(hit.similarity >= 0.85 && hit.similarity < 1.0);
    }

    #[tokio::test]
    async fn test_paraphrase_below_threshold_misses() {
        let embedder = MockEmbeddingProvider::new("mock", 2)
            .with_vector("O que são fundos imobiliários?", vec![1.0, 0.0])
            .with_vector("Como declarar imposto de renda?", vec![0.5, 0.5]);
        let service = service_with(Arc::new(InMemoryStore::new(100)), embedder);

        service
            .populate(
                "O que são fundos imobiliários?",
                "m",
                "Fundos imobiliários são veículos de investimento coletivo.",
            )
            .await;

        assert!(service
            .lookup("Como declarar imposto de renda?", "m")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_misses() {
        let service = SemanticCacheService::with_config(
            Arc::new(InMemoryStore::new(100)),
            Arc::new(MockEmbeddingProvider::new("mock", 64)),
            SemanticCacheConfig::new().with_ttl(Duration::from_secs(0)),
        );

        service
            .populate("prompt", "m", "a perfectly valid response")
            .await;

        assert!(service.lookup("prompt", "m").await.is_none());
    }

    #[tokio::test]
    async fn test_store_outage_degrades_silently() {
        let service = service_with(
            Arc::new(FailingStore::new()),
            MockEmbeddingProvider::new("mock", 64),
        );

        assert!(service.lookup("prompt", "m").await.is_none());

        let outcome = service
            .populate("prompt", "m", "a perfectly valid response")
            .await;
        assert_eq!(outcome, PopulateOutcome::Failed);
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_silently() {
        let service = service_with(
            Arc::new(InMemoryStore::new(100)),
            MockEmbeddingProvider::new("mock", 64).with_error("provider down"),
        );

        assert!(service.lookup("prompt", "m").await.is_none());
        assert_eq!(
            service
                .populate("prompt", "m", "a perfectly valid response")
                .await,
            PopulateOutcome::Failed
        );
    }

    #[tokio::test]
    async fn test_response_written_before_index() {
        // Index writes fail; the response may be written alone but a
        // reader must simply miss.
        let store = Arc::new(PrefixFailingStore::new(EMBEDDING_KEY_PREFIX));
        let service = service_with(store.clone(), MockEmbeddingProvider::new("mock", 64));

        let outcome = service
            .populate("prompt", "m", "a perfectly valid response")
            .await;

        assert_eq!(outcome, PopulateOutcome::Failed);
        assert!(service.lookup("prompt", "m").await.is_none());

        // Inverse: response writes fail, so nothing may reach the index.
        let store = Arc::new(PrefixFailingStore::new("response:"));
        let service = service_with(store.clone(), MockEmbeddingProvider::new("mock", 64));

        service
            .populate("prompt", "m", "a perfectly valid response")
            .await;

        let index_keys = store.scan_keys(EMBEDDING_KEY_PREFIX).await.unwrap();
        assert!(index_keys.is_empty());
    }

    #[tokio::test]
    async fn test_populate_overwrites_same_slot() {
        let service = service();

        service
            .populate("prompt", "m", "the first stored response")
            .await;
        service
            .populate("prompt", "m", "the second stored response")
            .await;

        let hit = service.lookup("prompt", "m").await.unwrap();
        assert_eq!(hit.response, "the second stored response");
    }

    #[tokio::test]
    async fn test_disabled_cache_is_inert() {
        let service = SemanticCacheService::with_config(
            Arc::new(InMemoryStore::new(100)),
            Arc::new(MockEmbeddingProvider::new("mock", 64)),
            SemanticCacheConfig::new().with_enabled(false),
        );

        assert_eq!(
            service
                .populate("prompt", "m", "a perfectly valid response")
                .await,
            PopulateOutcome::SkippedDisabled
        );
        assert!(service.lookup("prompt", "m").await.is_none());
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let embedder = MockEmbeddingProvider::new("mock", 2)
            .with_vector("prompt", vec![1.0, 0.0])
            .with_vector("something unrelated entirely", vec![0.0, 1.0]);
        let service = service_with(Arc::new(InMemoryStore::new(100)), embedder);

        service
            .populate("prompt", "m", "a perfectly valid response")
            .await;

        service.lookup("prompt", "m").await;
        service.lookup("something unrelated entirely", "m").await;

        let stats = service.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_invalidate_model() {
        let service = service();

        service
            .populate("p1", "model-a", "a perfectly valid response")
            .await;
        service
            .populate("p2", "model-a", "another valid response here")
            .await;
        service
            .populate("p3", "model-b", "a third valid response here")
            .await;

        let removed = service.invalidate_model("model-a").await;

        assert_eq!(removed, 2);
        assert!(service.lookup("p1", "model-a").await.is_none());
        assert!(service.lookup("p3", "model-b").await.is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let service = service();

        service
            .populate("prompt", "m", "a perfectly valid response")
            .await;
        service.lookup("prompt", "m").await;

        service.clear().await;

        assert!(service.lookup("prompt", "m").await.is_none());
        // Counters reset; the lookup above re-recorded one miss
        assert_eq!(service.stats().hits, 0);
    }

    #[test]
    fn test_hit_rate_with_no_lookups() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
