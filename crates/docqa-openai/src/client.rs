//! OpenAI-compatible client implementation

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use docqa_core::{
    EmbeddingProvider, Error, GenerationFailure, Generator, ModelCapabilities, Result,
};

use crate::config::ProviderConfig;

/// Client for an OpenAI-compatible embedding + chat endpoint
pub struct OpenAiClient {
    config: ProviderConfig,
    client: Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_thinking: Option<bool>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatStreamChoice {
    delta: ChatDelta,
}

#[derive(Deserialize)]
struct ChatStreamChunk {
    choices: Vec<ChatStreamChoice>,
}

impl OpenAiClient {
    /// Create a new client from configuration
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = ProviderConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let url = self.config.endpoint(path);

        self.client
            .post(&url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Request to {} timed out", url))
                } else {
                    Error::Network(e.to_string())
                }
            })
    }

    /// Build the chat request, applying the model's capability record.
    pub(crate) fn chat_request<'a>(
        prompt: &'a str,
        model: &'a str,
        temperature: f32,
    ) -> ChatRequest<'a> {
        let caps = ModelCapabilities::lookup(model);

        ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: caps.effective_temperature(temperature),
            stream: caps.requires_streaming,
            enable_thinking: caps.requires_thinking_disabled.then_some(false),
        }
    }

    /// Put embeddings back in input order. The indices must be exactly
    /// `0..expected`, each once.
    fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
        if data.len() != expected {
            return Err(Error::EmbeddingFailed(format!(
                "Expected {} embeddings, provider returned {}",
                expected,
                data.len()
            )));
        }

        data.sort_by_key(|d| d.index);
        if let Some((position, d)) = data.iter().enumerate().find(|(i, d)| d.index != *i) {
            return Err(Error::EmbeddingFailed(format!(
                "Provider returned embedding index {} where {} was expected",
                d.index, position
            )));
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    /// Concatenate the content deltas of a Server-Sent Events body.
    pub(crate) fn parse_stream(body: &str) -> String {
        let mut answer = String::new();

        for line in body.lines() {
            let Some(json_data) = line.strip_prefix("data:") else {
                continue;
            };
            let json_data = json_data.trim();

            if json_data.is_empty() || json_data == "[DONE]" {
                continue;
            }

            match serde_json::from_str::<ChatStreamChunk>(json_data) {
                Ok(chunk) => {
                    if let Some(content) = chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta.content)
                    {
                        answer.push_str(&content);
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to parse stream line: {} - Error: {}", json_data, e);
                }
            }
        }

        answer
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request_body = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: texts,
            encoding_format: "float",
        };

        let response = self.post("embeddings", &request_body).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::EmbeddingFailed(format!(
                "Embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Self::order_embeddings(parsed.data, texts.len())
    }

    fn model_id(&self) -> &str {
        &self.config.embedding_model
    }
}

#[async_trait]
impl Generator for OpenAiClient {
    async fn generate(&self, prompt: &str, model: &str, temperature: f32) -> Result<String> {
        let request_body = Self::chat_request(prompt, model, temperature);
        let streaming = request_body.stream;

        tracing::debug!(model, streaming, "Sending chat completion request");

        let response = self.post("chat/completions", &request_body).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Generation(GenerationFailure::classify(
                status.as_u16(),
                &error_text,
            )));
        }

        let answer = if streaming {
            let body = response
                .text()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
            Self::parse_stream(&body)
        } else {
            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::Serialization(e.to_string()))?;
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default()
        };

        if answer.trim().is_empty() {
            return Err(Error::Generation(GenerationFailure::Other(format!(
                "Empty response from model {}",
                model
            ))));
        }

        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            "\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{}}]}\n",
            "data: not json\n",
            "data: [DONE]\n",
        );
        assert_eq!(OpenAiClient::parse_stream(body), "Hello");
    }

    #[test]
    fn test_chat_request_applies_capabilities() {
        let request = OpenAiClient::chat_request("hi", "qwen3-8b", 0.3);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["enable_thinking"], serde_json::json!(false));
        assert_eq!(json["stream"], serde_json::json!(false));

        let request = OpenAiClient::chat_request("hi", "qwq-plus", 0.3);
        assert!(request.stream);

        let request = OpenAiClient::chat_request("hi", "qwen-plus", 0.3);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("enable_thinking").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    fn embedding_data(body: &str) -> Vec<EmbeddingData> {
        serde_json::from_str::<EmbeddingResponse>(body).unwrap().data
    }

    #[test]
    fn test_embeddings_follow_index_order() {
        let data = embedding_data(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        );
        let vectors = OpenAiClient::order_embeddings(data, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_embedding_indices_must_cover_every_input() {
        let duplicated = embedding_data(
            r#"{"data":[{"index":0,"embedding":[1.0]},{"index":0,"embedding":[2.0]}]}"#,
        );
        assert!(matches!(
            OpenAiClient::order_embeddings(duplicated, 2),
            Err(Error::EmbeddingFailed(_))
        ));

        let out_of_range = embedding_data(
            r#"{"data":[{"index":0,"embedding":[1.0]},{"index":5,"embedding":[2.0]}]}"#,
        );
        assert!(matches!(
            OpenAiClient::order_embeddings(out_of_range, 2),
            Err(Error::EmbeddingFailed(_))
        ));

        let short = embedding_data(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#);
        assert!(matches!(
            OpenAiClient::order_embeddings(short, 2),
            Err(Error::EmbeddingFailed(_))
        ));
    }

    #[test]
    fn test_min_temperature_is_enforced() {
        let request = OpenAiClient::chat_request("hi", "o1-mini", 0.0);
        assert_eq!(request.temperature, 1.0);
    }
}
