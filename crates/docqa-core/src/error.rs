//! Error types for docqa

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the docqa system
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Empty content: {0}")]
    EmptyContent(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("Vector dimension mismatch: store holds {expected}-d vectors, got {actual}-d")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Generation failed: {0}")]
    Generation(GenerationFailure),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// Categorized failure reported by the generation collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("{0}")]
    Other(String),
}

impl GenerationFailure {
    /// Classify a failed provider response from its HTTP status and body.
    pub fn classify(status: u16, body: &str) -> Self {
        let lower = body.to_lowercase();
        let detail = format!("status {}: {}", status, body.trim());

        if status == 401
            || status == 403
            || lower.contains("invalid api key")
            || lower.contains("invalid_api_key")
            || lower.contains("invalidapikey")
        {
            GenerationFailure::InvalidCredentials(detail)
        } else if lower.contains("quota")
            || lower.contains("insufficient")
            || lower.contains("arrearage")
            || lower.contains("billing")
        {
            GenerationFailure::QuotaExceeded(detail)
        } else if status == 429 || lower.contains("rate limit") || lower.contains("throttl") {
            GenerationFailure::RateLimited(detail)
        } else if status == 404
            || lower.contains("model_not_found")
            || lower.contains("model not found")
            || lower.contains("does not exist")
        {
            GenerationFailure::ModelUnavailable(detail)
        } else {
            GenerationFailure::Other(detail)
        }
    }
}

impl Error {
    /// Message suitable for showing to an end user.
    ///
    /// Generation failures are translated into friendly categories and input
    /// problems are reported as-is; everything else collapses into a generic
    /// failure whose detail belongs in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Generation(GenerationFailure::QuotaExceeded(_)) => {
                "The model provider quota is exhausted. Check your plan or billing and try again."
                    .to_string()
            }
            Error::Generation(GenerationFailure::InvalidCredentials(_)) => {
                "The API key was rejected by the model provider. Check DOCQA_API_KEY.".to_string()
            }
            Error::Generation(GenerationFailure::RateLimited(_)) => {
                "The model provider is rate limiting requests. Wait a moment and retry.".to_string()
            }
            Error::Generation(GenerationFailure::ModelUnavailable(_)) => {
                "The configured model is not available. Choose another one with `config model=<name>`."
                    .to_string()
            }
            Error::Configuration(msg) => format!("Configuration error: {}", msg),
            Error::ExtractionFailed(msg) => format!("Could not read the file: {}", msg),
            Error::EmptyContent(msg) => format!("The document has no usable content: {}", msg),
            Error::InvalidInput(msg) => format!("Invalid input: {}", msg),
            _ => "Something went wrong while processing the request. See the logs for details."
                .to_string(),
        }
    }

    /// Whether the caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::Network(_) | Error::Generation(GenerationFailure::RateLimited(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_generation_failures() {
        assert!(matches!(
            GenerationFailure::classify(401, "Unauthorized"),
            GenerationFailure::InvalidCredentials(_)
        ));
        assert!(matches!(
            GenerationFailure::classify(400, r#"{"code":"InvalidApiKey"}"#),
            GenerationFailure::InvalidCredentials(_)
        ));
        assert!(matches!(
            GenerationFailure::classify(429, "You exceeded your current quota"),
            GenerationFailure::QuotaExceeded(_)
        ));
        assert!(matches!(
            GenerationFailure::classify(429, "Too many requests"),
            GenerationFailure::RateLimited(_)
        ));
        assert!(matches!(
            GenerationFailure::classify(404, "The model `gpt-x` does not exist"),
            GenerationFailure::ModelUnavailable(_)
        ));
        assert!(matches!(
            GenerationFailure::classify(500, "boom"),
            GenerationFailure::Other(_)
        ));
    }

    #[test]
    fn test_user_message_hides_internal_detail() {
        let err = Error::VectorStore("Lock error: poisoned".to_string());
        assert!(!err.user_message().contains("poisoned"));

        let err = Error::Generation(GenerationFailure::RateLimited("status 429".to_string()));
        assert!(err.user_message().contains("rate limiting"));
    }

    #[test]
    fn test_retryable() {
        assert!(Error::Timeout("embedding".to_string()).is_retryable());
        assert!(!Error::EmptyContent("hi".to_string()).is_retryable());
        assert!(!Error::DimensionMismatch { expected: 3, actual: 4 }.is_retryable());
    }
}
