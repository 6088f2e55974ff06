//! Batching client in front of an [`EmbeddingProvider`]

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use docqa_core::{EmbeddingProvider, Error, Result};

/// Largest number of texts sent to the provider in one request.
pub const MAX_BATCH_SIZE: usize = 10;
/// Texts longer than this many characters are truncated before embedding.
pub const MAX_INPUT_CHARS: usize = 2048;
pub const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(30);

/// Embeds texts in provider-sized sub-batches, preserving input order.
///
/// A failure in any sub-batch fails the whole call; partial results are
/// never returned because callers pair vectors with chunks by position.
pub struct EmbeddingClient<P: EmbeddingProvider> {
    provider: Arc<P>,
    batch_size: usize,
    timeout: Duration,
}

impl<P: EmbeddingProvider> Clone for EmbeddingClient<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            batch_size: self.batch_size,
            timeout: self.timeout,
        }
    }
}

impl<P: EmbeddingProvider> EmbeddingClient<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            batch_size: MAX_BATCH_SIZE,
            timeout: DEFAULT_EMBEDDING_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Lower the sub-batch size. Values are clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    /// Trim and truncate one input text.
    pub fn prepare(text: &str) -> String {
        let trimmed = text.trim();
        match trimmed.char_indices().nth(MAX_INPUT_CHARS) {
            Some((cut, _)) => trimmed[..cut].to_string(),
            None => trimmed.to_string(),
        }
    }

    /// Embed `texts`; `result[i]` is the vector for `texts[i]`.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let prepared: Vec<String> = texts.iter().map(|t| Self::prepare(t)).collect();
        let mut vectors = Vec::with_capacity(prepared.len());

        for (batch_index, batch) in prepared.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                batch = batch_index,
                size = batch.len(),
                model = self.provider.model_id(),
                "Embedding sub-batch"
            );

            let embedded = match timeout(self.timeout, self.provider.embed(batch)).await {
                Ok(Ok(embedded)) => embedded,
                Ok(Err(e)) => return Err(Self::embedding_error(e)),
                Err(_) => {
                    return Err(Error::Timeout(format!(
                        "Embedding sub-batch {} timed out after {:?}",
                        batch_index, self.timeout
                    )));
                }
            };

            if embedded.len() != batch.len() {
                return Err(Error::EmbeddingFailed(format!(
                    "Sub-batch {} sent {} texts but received {} vectors",
                    batch_index,
                    batch.len(),
                    embedded.len()
                )));
            }
            if embedded.iter().any(|v| v.is_empty()) {
                return Err(Error::EmbeddingFailed(format!(
                    "Sub-batch {} contained an empty vector",
                    batch_index
                )));
            }

            vectors.extend(embedded);
        }

        Ok(vectors)
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::EmbeddingFailed("Provider returned no vector".to_string()))
    }

    fn embedding_error(err: Error) -> Error {
        match err {
            Error::EmbeddingFailed(_) | Error::Timeout(_) | Error::Configuration(_) => err,
            other => Error::EmbeddingFailed(other.to_string()),
        }
    }
}
