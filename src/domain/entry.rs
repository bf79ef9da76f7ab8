//! Stored entry schemas for the two cache stores

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::domain::Fingerprint;

/// Current wall-clock time as unix seconds
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A finalized response stored by the Response Store
///
/// Created once per validated populate, never mutated afterwards; a later
/// populate for the same fingerprint supersedes it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache slot this response belongs to
    fingerprint: Fingerprint,
    /// The response text returned on future hits
    response_text: String,
    /// Model the response was generated for
    model: String,
    /// When this entry was created (unix seconds)
    created_at: u64,
    /// When this entry expires (unix seconds)
    expires_at: u64,
}

impl CacheEntry {
    /// Create a new cache entry expiring `ttl` from now
    pub fn new(
        fingerprint: Fingerprint,
        response_text: impl Into<String>,
        model: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let now = unix_timestamp();

        Self {
            fingerprint,
            response_text: response_text.into(),
            model: model.into(),
            created_at: now,
            expires_at: now + ttl.as_secs(),
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Check if the entry has passed its expiration
    ///
    /// The backing store also expires the key on its own; this check covers
    /// the window where a store TTL and wall clock disagree at the boundary.
    pub fn is_expired(&self) -> bool {
        unix_timestamp() >= self.expires_at
    }
}

/// A prompt embedding stored by the Embedding Index
///
/// Created 1:1 alongside a `CacheEntry` with the same expiration. The
/// `fingerprint` is a by-value reference used to resolve a similarity hit
/// into the paired response; if that response is already gone the hit
/// degrades to a miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingEntry {
    /// Original prompt, kept for similarity-source diagnostics
    prompt_text: String,
    /// Embedding vector of the prompt
    embedding: Vec<f32>,
    /// Model this entry is partitioned under
    model: String,
    /// Fingerprint of the paired cache entry
    fingerprint: Fingerprint,
    /// When this entry was created (unix seconds)
    created_at: u64,
    /// When this entry expires (unix seconds)
    expires_at: u64,
}

impl EmbeddingEntry {
    /// Create a new embedding entry expiring `ttl` from now
    pub fn new(
        prompt_text: impl Into<String>,
        embedding: Vec<f32>,
        model: impl Into<String>,
        fingerprint: Fingerprint,
        ttl: Duration,
    ) -> Self {
        let now = unix_timestamp();

        Self {
            prompt_text: prompt_text.into(),
            embedding,
            model: model.into(),
            fingerprint,
            created_at: now,
            expires_at: now + ttl.as_secs(),
        }
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Check if the entry has passed its expiration
    pub fn is_expired(&self) -> bool {
        unix_timestamp() >= self.expires_at
    }
}
