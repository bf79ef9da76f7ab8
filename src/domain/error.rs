use thiserror::Error;

/// Core cache errors
///
/// None of these ever reach the caller of the public service API; the
/// coordinator maps every failure to a miss (lookup) or a skipped write
/// (populate). The variants exist so the degrade path can tell a store
/// outage apart from a corrupted payload when logging.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Malformed stored entry: {message}")]
    MalformedEntry { message: String },

    #[error("Embedding provider error: {message}")]
    Embedding { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Timed out: {message}")]
    Timeout { message: String },
}

impl CacheError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn malformed_entry(message: impl Into<String>) -> Self {
        Self::MalformedEntry {
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }
}
