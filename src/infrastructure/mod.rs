//! Store backends and the cache coordinator

pub mod index;
pub mod response_store;
pub mod service;
pub mod store;

pub use index::{EmbeddingIndex, IndexMatch};
pub use response_store::ResponseStore;
pub use service::{CacheHit, CacheStats, PopulateOutcome, SemanticCacheService};
pub use store::{InMemoryStore, RedisStore, RedisStoreConfig};
