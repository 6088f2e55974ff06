//! OpenAI-compatible provider for docqa
//!
//! This crate provides the HTTP implementation of the `EmbeddingProvider`
//! and `Generator` traits against any endpoint that speaks the OpenAI
//! `/embeddings` and `/chat/completions` protocol.

mod client;
mod config;


pub use client::OpenAiClient;
pub use config::ProviderConfig;

// Re-export core types for convenience
pub use docqa_core::{EmbeddingProvider, Error, GenerationFailure, Generator, ModelCapabilities, Result};
