//! Provider configuration

use docqa_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-v3";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Configuration for the OpenAI-compatible client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    /// Create configuration from environment variables.
    ///
    /// A missing API key is a configuration error: it has to surface before
    /// any document is ingested or question asked.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("DOCQA_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration(
                    "DOCQA_API_KEY or OPENAI_API_KEY environment variable not found".to_string(),
                )
            })?;

        let base_url = env::var("DOCQA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let embedding_model = env::var("DOCQA_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());

        let request_timeout_secs = match env::var("DOCQA_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Configuration(format!(
                    "DOCQA_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let config = Self {
            api_key,
            base_url,
            embedding_model,
            request_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration with explicit values
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("API key must not be empty".to_string()));
        }
        let url = Url::parse(&self.base_url).map_err(|e| {
            Error::Configuration(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Configuration(format!(
                "Base URL must be http(s), got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "Request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Join an API path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
