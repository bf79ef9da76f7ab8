//! Embedding provider seam and vector similarity

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::CacheError;

/// Trait for embedding providers
///
/// The provider must be deterministic for identical input and the same
/// provider/model must back every entry in a deployment; switching
/// providers invalidates all prior entries.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate the embedding vector for the given text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CacheError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the dimensions of vectors this provider produces
    fn dimensions(&self) -> usize;
}

/// Calculate cosine similarity between two vectors
///
/// Result in [-1, 1]. Mismatched or empty dimensions and zero vectors
/// yield 0.0, which is always below any usable threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}


#[cfg(test)]
pub use mock::MockEmbeddingProvider;
