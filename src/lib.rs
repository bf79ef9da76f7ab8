//! Semantic LLM response cache
//!
//! Deduplicates LLM calls by comparing sentence embeddings of incoming
//! prompts against previously cached prompts, so semantically similar
//! queries reuse an earlier response instead of hitting the backend again.
//!
//! The cache is two stores over one backing key-value store: an embedding
//! index answering "what is the most similar prompt already seen for this
//! model?" and a response store resolving that match into response text.
//! A validator keeps error and timeout text out of both stores, and every
//! failure inside the cache degrades to a miss rather than surfacing to
//! the caller.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use semantic_llm_cache::{SemanticCacheService, SemanticCacheConfig, InMemoryStore};
//! # use semantic_llm_cache::domain::EmbeddingProvider;
//! # async fn example(embedder: Arc<dyn EmbeddingProvider>) {
//! let store = Arc::new(InMemoryStore::new(10_000));
//! let cache = SemanticCacheService::with_config(
//!     store,
//!     embedder,
//!     SemanticCacheConfig::new().with_similarity_threshold(0.85),
//! );
//!
//! cache.populate("Qual a capital do Brasil?", "deepseek", "Brasília.").await;
//!
//! if let Some(hit) = cache.lookup("Me diga a capital do Brasil", "deepseek").await {
//!     println!("hit ({:.3}): {}", hit.similarity, hit.response);
//! }
//! # }
//! ```

pub mod domain;
pub mod infrastructure;

pub use domain::{
    cosine_similarity, is_cacheable, CacheEntry, CacheError, EmbeddingEntry, EmbeddingProvider,
    Fingerprint, KeyValueStore, SemanticCacheConfig,
};
pub use infrastructure::{
    CacheHit, CacheStats, EmbeddingIndex, InMemoryStore, IndexMatch, PopulateOutcome,
    RedisStore, RedisStoreConfig, ResponseStore, SemanticCacheService,
};
