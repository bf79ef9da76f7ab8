//! Cache fingerprints and backing-store key layout

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Key prefix for response entries in the backing store
pub const RESPONSE_KEY_PREFIX: &str = "response:";

/// Key prefix for embedding entries in the backing store
pub const EMBEDDING_KEY_PREFIX: &str = "embedding:";

/// Deterministic key identifying a (prompt, model) cache slot
///
/// Derived as the hex SHA-256 digest of `model:trimmed-prompt`, so both
/// stores key their entry for a slot off the same value and the model is
/// always part of the identity. Recomputing the fingerprint for the same
/// pair always yields the same digest, which is what makes a repeated
/// populate an overwrite rather than a new slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for a prompt and model
    pub fn compute(prompt: &str, model: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(b":");
        hasher.update(prompt.trim().as_bytes());

        Self(hex::encode(hasher.finalize()))
    }

    /// Get the hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backing-store key for the response entry of this slot
    pub fn response_key(&self) -> String {
        format!("{}{}", RESPONSE_KEY_PREFIX, self.0)
    }

    /// Backing-store key for the embedding entry of this slot
    pub fn embedding_key(&self) -> String {
        format!("{}{}", EMBEDDING_KEY_PREFIX, self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
