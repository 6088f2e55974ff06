//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Trait for the external embedding service.
///
/// One call embeds one request's worth of texts; batching, truncation and
/// timeouts are the caller's concern. The returned vectors must be in the
/// same order as `texts`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding model ID being used
    fn model_id(&self) -> &str;
}
