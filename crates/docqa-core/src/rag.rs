//! Query result types

use serde::{Deserialize, Serialize};

use crate::Chunk;

/// A chunk returned by similarity search, with its score (higher is closer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Result of answering a question against the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer_text: String,
    pub retrieved_chunks: Vec<RetrievedChunk>,
    pub suggested_questions: Vec<String>,
}
