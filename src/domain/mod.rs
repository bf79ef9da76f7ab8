//! Domain types and traits for the semantic cache

pub mod config;
pub mod embedding;
pub mod entry;
pub mod error;
pub mod fingerprint;
pub mod store;
pub mod validator;

pub use config::SemanticCacheConfig;
pub use embedding::{cosine_similarity, EmbeddingProvider};
pub use entry::{CacheEntry, EmbeddingEntry};
pub use error::CacheError;
pub use fingerprint::{Fingerprint, EMBEDDING_KEY_PREFIX, RESPONSE_KEY_PREFIX};
pub use store::KeyValueStore;
pub use validator::is_cacheable;

#[cfg(test)]
pub use embedding::MockEmbeddingProvider;
#[cfg(test)]
pub use store::FailingStore;
