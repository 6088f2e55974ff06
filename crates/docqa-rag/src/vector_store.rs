//! In-memory exact-search vector store

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::RwLock;

use docqa_core::{Chunk, ChunkId, Error, Result, RetrievedChunk};

/// Entry count past which the linear scan is expected to become slow.
/// Inserts are never refused; crossing it only logs a warning.
pub const LINEAR_SCAN_CEILING: usize = 20_000;

/// A stored vector together with the chunk it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorEntry {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

/// Row-major matrix of unit-normalized vectors, one row per entry.
#[derive(Debug, Default)]
struct FlatIndex {
    dimension: usize,
    rows: Vec<f32>,
}

impl FlatIndex {
    fn push(&mut self, vector: &[f32]) {
        let norm = l2_norm(vector);
        if norm > 0.0 {
            self.rows.extend(vector.iter().map(|x| x / norm));
        } else {
            self.rows.extend(std::iter::repeat_n(0.0, vector.len()));
        }
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.rows[i * self.dimension..(i + 1) * self.dimension]
    }
}

#[derive(Debug, Default)]
struct StoreState {
    // Fixed by the first insertion, released only by `clear`.
    dimension: Option<usize>,
    entries: Vec<VectorEntry>,
    index: FlatIndex,
    ceiling_warned: bool,
}

impl StoreState {
    fn rebuild_index(&mut self) {
        let mut index = FlatIndex {
            dimension: self.dimension.unwrap_or(0),
            rows: Vec::with_capacity(self.entries.len() * self.dimension.unwrap_or(0)),
        };
        for entry in &self.entries {
            index.push(&entry.vector);
        }
        self.index = index;
    }
}

/// Exact cosine-similarity store over (vector, chunk) entries.
///
/// Search is a linear scan over every entry. Deletion rebuilds the flat
/// index from the surviving entries using their retained vectors, so no
/// embedding call is needed.
#[derive(Debug, Default)]
pub struct VectorStore {
    state: RwLock<StoreState>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries, pairing `vectors[i]` with `chunks[i]`.
    ///
    /// Nothing is inserted if any vector's length differs from the store's
    /// dimension.
    pub fn add(&self, vectors: Vec<Vec<f32>>, chunks: Vec<Chunk>) -> Result<()> {
        if vectors.len() != chunks.len() {
            return Err(Error::InvalidInput(format!(
                "Got {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        if vectors.is_empty() {
            return Ok(());
        }

        let mut state = self
            .state
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;

        let expected = state.dimension.unwrap_or(vectors[0].len());
        if expected == 0 {
            return Err(Error::InvalidInput("Cannot store zero-length vectors".to_string()));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(Error::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        if state.dimension.is_none() {
            state.dimension = Some(expected);
            state.index.dimension = expected;
        }

        for (vector, chunk) in vectors.into_iter().zip(chunks) {
            state.index.push(&vector);
            state.entries.push(VectorEntry { vector, chunk });
        }

        if state.entries.len() > LINEAR_SCAN_CEILING && !state.ceiling_warned {
            state.ceiling_warned = true;
            tracing::warn!(
                entries = state.entries.len(),
                ceiling = LINEAR_SCAN_CEILING,
                "Vector store exceeded the linear-scan capacity ceiling; searches will slow down"
            );
        }

        Ok(())
    }

    /// Return up to `k` entries most similar to `query`, best first.
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let state = self
            .state
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;

        if k == 0 || state.entries.is_empty() {
            return Ok(Vec::new());
        }

        let dimension = state.index.dimension;
        if query.len() != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        let norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = (0..state.entries.len())
            .map(|i| {
                let score = if norm > 0.0 {
                    dot(query, state.index.row(i)) / norm
                } else {
                    0.0
                };
                (i, score)
            })
            .collect();

        // Best score first, then lower insertion index.
        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
        };

        if scored.len() > k {
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);

        tracing::debug!(candidates = state.entries.len(), returned = scored.len(), "Vector search");

        Ok(scored
            .into_iter()
            .map(|(i, score)| RetrievedChunk {
                chunk: state.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    /// Drop every entry of `doc_id` and rebuild the index from the survivors.
    /// Returns the number of remaining entries. Unknown ids are a no-op.
    pub fn remove_by_doc_id(&self, doc_id: &str) -> Result<usize> {
        self.retain(|chunk| chunk.source_doc_id != doc_id)
    }

    /// Drop the entries whose chunk identity is in `ids`.
    /// Returns the number of remaining entries.
    pub fn remove_chunks(&self, ids: &[ChunkId]) -> Result<usize> {
        let ids: HashSet<&str> = ids.iter().map(ChunkId::as_str).collect();
        self.retain(|chunk| !ids.contains(chunk.id().as_str()))
    }

    fn retain(&self, keep: impl Fn(&Chunk) -> bool) -> Result<usize> {
        let mut state = self
            .state
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;

        let before = state.entries.len();
        state.entries.retain(|e| keep(&e.chunk));
        let remaining = state.entries.len();

        if remaining != before {
            state.rebuild_index();
            tracing::debug!(removed = before - remaining, remaining, "Rebuilt vector index");
        }

        Ok(remaining)
    }

    /// Recompute the internal index from the retained entries.
    pub fn rebuild(&self) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        state.rebuild_index();
        Ok(())
    }

    /// Drop all entries and release the dimension.
    pub fn clear(&self) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        *state = StoreState::default();
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        Ok(state.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn dimension(&self) -> Result<Option<usize>> {
        let state = self
            .state
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        Ok(state.dimension)
    }

    /// Number of live entries belonging to `doc_id`.
    pub fn count_for_document(&self, doc_id: &str) -> Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.chunk.source_doc_id == doc_id)
            .count())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
