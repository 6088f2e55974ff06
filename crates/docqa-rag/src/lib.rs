//! Retrieval-augmented document store for docqa
//!
//! This crate provides the chunker, the batching embedding client, the
//! in-memory vector store, the document registry and the retrieval pipeline
//! that ties them together.

mod chunker;
mod embedding;
mod extract;
mod pipeline;
mod prompt;
mod registry;
mod vector_store;

#[cfg(test)]
mod testing;

pub use chunker::{Chunker, ChunkerConfig, DEFAULT_SEPARATORS, split as split_text};
pub use embedding::{DEFAULT_EMBEDDING_TIMEOUT, EmbeddingClient, MAX_BATCH_SIZE, MAX_INPUT_CHARS};
pub use extract::{PlainTextExtractor, markdown_to_text};
pub use pipeline::{
    DEFAULT_GENERATION_TIMEOUT, MIN_CONTENT_CHARS, NO_RELEVANT_INFORMATION, ReindexFailure,
    ReindexReport, ReindexedDocument, RetrievalPipeline, SourceDocument,
};
pub use prompt::{FOLLOW_UP_SEPARATOR, ParsedResponse, build_context, build_prompt, parse_response};
pub use registry::DocumentRegistry;
pub use vector_store::{LINEAR_SCAN_CEILING, VectorEntry, VectorStore};

// Re-export core types for convenience
pub use docqa_core::{
    Chunk, ChunkId, ConfigState, DocumentRecord, EmbeddingProvider, Error, Extractor, FileType,
    GenerationFailure, Generator, QueryAnswer, RagConfig, RagConfigUpdate, Result,
    RetrievedChunk, StoreStats,
};
