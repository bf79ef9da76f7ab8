//! Backing store implementations

mod in_memory;
mod redis;

pub use in_memory::InMemoryStore;
pub use redis::{RedisStore, RedisStoreConfig};
