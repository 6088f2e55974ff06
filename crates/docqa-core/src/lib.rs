//! Core traits and types for docqa
//!
//! This crate defines the fundamental types shared across the docqa system:
//! the error taxonomy, the chunk/document data model, the tunable retrieval
//! configuration, and the capability-facing traits for the external
//! collaborators (embedding service, text generator, file extractor).

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod llm;
pub mod rag;
pub mod types;


pub use config::{ConfigState, RagConfig, RagConfigUpdate};
pub use document::{DocumentRecord, StoreStats, generate_document_id};
pub use embedding::EmbeddingProvider;
pub use error::{Error, GenerationFailure, Result};
pub use extract::Extractor;
pub use llm::{Generator, ModelCapabilities};
pub use rag::{QueryAnswer, RetrievedChunk};
pub use types::{Chunk, ChunkId, FileType};
