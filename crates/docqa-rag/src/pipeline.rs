//! Retrieval pipeline implementation
//!
//! Ingestion turns raw text into chunks, embeds them and commits the chunks,
//! vectors and the document record together. Answering embeds the question,
//! retrieves the closest chunks and asks the generator for a grounded answer.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;

use docqa_core::config::TOP_K_RANGE;
use docqa_core::{
    Chunk, ChunkId, ConfigState, DocumentRecord, EmbeddingProvider, Error, Extractor, FileType,
    Generator, QueryAnswer, RagConfig, RagConfigUpdate, Result, RetrievedChunk, StoreStats,
};

use crate::chunker::{Chunker, ChunkerConfig};
use crate::embedding::EmbeddingClient;
use crate::extract::PlainTextExtractor;
use crate::prompt::{build_prompt, parse_response};
use crate::registry::DocumentRegistry;
use crate::vector_store::VectorStore;

/// Documents with fewer characters than this after trimming are rejected.
pub const MIN_CONTENT_CHARS: usize = 10;
/// Answer returned when nothing can be retrieved.
pub const NO_RELEVANT_INFORMATION: &str =
    "No relevant information was found in the uploaded documents. Please upload documents first or rephrase your question.";
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Source text of a document, kept by callers that want to re-ingest it.
///
/// `doc_id` names the live document built from this text, if there is one;
/// re-ingestion replaces that document.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub filename: String,
    pub file_type: FileType,
    pub text: String,
    pub doc_id: Option<String>,
}

impl SourceDocument {
    /// Build a source whose type is detected from the filename extension.
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            file_type: FileType::from_filename(&filename),
            filename,
            text: text.into(),
            doc_id: None,
        }
    }

    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }
}

/// Outcome of a re-ingestion pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReindexReport {
    pub ingested: Vec<ReindexedDocument>,
    pub failed: Vec<ReindexFailure>,
}

/// A document rebuilt by re-ingestion, with the id it replaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReindexedDocument {
    pub previous_id: Option<String>,
    pub record: DocumentRecord,
}

/// A source that could not be re-ingested. Its previous document, if any,
/// is still live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReindexFailure {
    pub filename: String,
    pub doc_id: Option<String>,
    pub reason: String,
}

/// A chunked and embedded document that has not been committed yet.
struct PreparedDocument {
    record: DocumentRecord,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

/// Orchestrates ingestion and question answering over one in-memory store.
///
/// Store and registry mutations are serialized by a single writer lock, so
/// a reader never sees a record without its chunks. Ingestion embeds before
/// the lock is taken; reindex embeds while holding it.
pub struct RetrievalPipeline<P: EmbeddingProvider, G: Generator> {
    embedder: EmbeddingClient<P>,
    generator: Arc<G>,
    extractor: Arc<dyn Extractor>,
    store: VectorStore,
    registry: DocumentRegistry,
    config: ConfigState,
    write_lock: Mutex<()>,
    generation_timeout: Duration,
}

impl<P: EmbeddingProvider, G: Generator> RetrievalPipeline<P, G> {
    /// Create a pipeline over an empty store.
    pub fn new(provider: Arc<P>, generator: Arc<G>, config: RagConfig) -> Result<Self> {
        Ok(Self {
            embedder: EmbeddingClient::new(provider),
            generator,
            extractor: Arc::new(PlainTextExtractor),
            store: VectorStore::new(),
            registry: DocumentRegistry::new(),
            config: ConfigState::new(config)?,
            write_lock: Mutex::new(()),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        })
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_embedding_timeout(mut self, timeout: Duration) -> Self {
        self.embedder = self.embedder.with_timeout(timeout);
        self
    }

    /// Replace the extractor used by [`ingest_file`](Self::ingest_file).
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> Result<RagConfig> {
        self.config.get()
    }

    /// Apply a partial configuration update. Chunking changes only affect
    /// documents ingested afterwards.
    pub fn update_config(&self, update: &RagConfigUpdate) -> Result<RagConfig> {
        let config = self.config.update(update)?;
        tracing::info!(
            top_k = config.top_k,
            chunk_size = config.chunk_size,
            chunk_overlap = config.chunk_overlap,
            model = %config.model,
            "Configuration updated"
        );
        Ok(config)
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Ingest extracted text using the current chunking configuration.
    pub async fn ingest(
        &self,
        raw_text: &str,
        filename: &str,
        file_type: FileType,
    ) -> Result<DocumentRecord> {
        let chunking = ChunkerConfig::from(&self.config.get()?);
        self.ingest_with_chunking(raw_text, filename, file_type, chunking)
            .await
    }

    /// Ingest extracted text with explicit chunk limits.
    ///
    /// All-or-nothing: if chunking, embedding or the commit fails, the store
    /// and the registry are left exactly as they were.
    pub async fn ingest_with_chunking(
        &self,
        raw_text: &str,
        filename: &str,
        file_type: FileType,
        chunking: ChunkerConfig,
    ) -> Result<DocumentRecord> {
        let prepared = self
            .prepare(raw_text, filename, file_type, chunking)
            .await?;
        let guard = self.write_lock.lock().await;
        self.commit(&guard, prepared)
    }

    /// Extract a file's bytes with the configured extractor, then ingest it.
    pub async fn ingest_file(&self, bytes: &[u8], filename: &str) -> Result<DocumentRecord> {
        let source = self.extract(bytes, filename)?;
        self.ingest_source(&source).await
    }

    /// Run the configured extractor over a file's bytes.
    pub fn extract(&self, bytes: &[u8], filename: &str) -> Result<SourceDocument> {
        let file_type = FileType::from_filename(filename);
        let text = self.extractor.extract(bytes, file_type)?;
        tracing::debug!(filename, %file_type, chars = text.chars().count(), "Extracted text");
        Ok(SourceDocument {
            filename: filename.to_string(),
            file_type,
            text,
            doc_id: None,
        })
    }

    pub async fn ingest_source(&self, source: &SourceDocument) -> Result<DocumentRecord> {
        self.ingest(&source.text, &source.filename, source.file_type)
            .await
    }

    async fn prepare(
        &self,
        raw_text: &str,
        filename: &str,
        file_type: FileType,
        chunking: ChunkerConfig,
    ) -> Result<PreparedDocument> {
        let text = raw_text.trim();
        let length = text.chars().count();
        if length < MIN_CONTENT_CHARS {
            return Err(Error::EmptyContent(format!(
                "{} contains {} characters of text, at least {} are required",
                filename, length, MIN_CONTENT_CHARS
            )));
        }

        let mut texts = Chunker::new(chunking)?.split(text);
        if texts.is_empty() {
            tracing::debug!(filename, "Chunker produced nothing; using the whole text");
            texts.push(text.to_string());
        }

        tracing::info!(filename, chunks = texts.len(), "Embedding document");
        let vectors = self.embedder.embed_batch(&texts).await?;

        let record = DocumentRecord::new(filename, file_type, texts.len());
        let chunks = texts
            .into_iter()
            .enumerate()
            .map(|(sequence_index, text)| Chunk {
                text,
                source_doc_id: record.id.clone(),
                source_filename: filename.to_string(),
                file_type,
                sequence_index,
            })
            .collect();

        Ok(PreparedDocument {
            record,
            chunks,
            vectors,
        })
    }

    // Caller holds the writer lock.
    fn commit(
        &self,
        _guard: &MutexGuard<'_, ()>,
        prepared: PreparedDocument,
    ) -> Result<DocumentRecord> {
        let PreparedDocument {
            record,
            chunks,
            vectors,
        } = prepared;

        let chunk_ids: Vec<ChunkId> = chunks.iter().map(Chunk::id).collect();
        self.store.add(vectors, chunks)?;
        if let Err(e) = self
            .registry
            .record_ingestion(record.clone(), chunk_ids.clone())
        {
            self.store.remove_chunks(&chunk_ids)?;
            return Err(e);
        }

        tracing::info!(
            doc_id = %record.id,
            filename = %record.filename,
            chunks = record.chunk_count,
            "Document ingested"
        );
        Ok(record)
    }

    // Caller holds the writer lock. Store entries go before the record.
    fn remove(
        &self,
        _guard: &MutexGuard<'_, ()>,
        doc_id: &str,
    ) -> Result<Option<(DocumentRecord, usize)>> {
        let Some(record) = self.registry.get(doc_id)? else {
            return Ok(None);
        };
        let chunk_ids = self.registry.chunk_ids(doc_id)?;

        let before = self.store.len()?;
        let remaining = self.store.remove_chunks(&chunk_ids)?;
        self.registry.remove(doc_id)?;

        Ok(Some((record, before - remaining)))
    }

    // The previous document is only dropped once the new one is committed.
    fn replace(
        &self,
        guard: &MutexGuard<'_, ()>,
        previous_id: Option<&str>,
        prepared: PreparedDocument,
    ) -> Result<DocumentRecord> {
        let record = self.commit(guard, prepared)?;

        if let Some(previous_id) = previous_id {
            if let Err(e) = self.remove(guard, previous_id) {
                self.remove(guard, &record.id)?;
                return Err(e);
            }
        }

        Ok(record)
    }

    /// Return the `top_k` chunks closest to `question`.
    ///
    /// An empty store returns no chunks without calling the embedding service.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question must not be empty".to_string()));
        }
        if self.store.is_empty()? {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_one(question).await?;
        self.store.search(&query, top_k)
    }

    /// Answer `question` from the stored documents.
    ///
    /// `top_k` overrides the configured retrieval depth for this call only.
    pub async fn answer(&self, question: &str, top_k: Option<usize>) -> Result<QueryAnswer> {
        let config = self.config.get()?;
        let top_k = match top_k {
            Some(k) if !TOP_K_RANGE.contains(&k) => {
                return Err(Error::InvalidInput(format!(
                    "topK must be within {}..={}, got {}",
                    TOP_K_RANGE.start(),
                    TOP_K_RANGE.end(),
                    k
                )));
            }
            Some(k) => k,
            None => config.top_k,
        };

        let retrieved = self.retrieve(question, top_k).await?;
        if retrieved.is_empty() {
            tracing::info!("Nothing to retrieve; skipping generation");
            return Ok(QueryAnswer {
                answer_text: NO_RELEVANT_INFORMATION.to_string(),
                retrieved_chunks: Vec::new(),
                suggested_questions: Vec::new(),
            });
        }

        let prompt = build_prompt(question, &retrieved);
        tracing::debug!(
            chunks = retrieved.len(),
            prompt_chars = prompt.chars().count(),
            model = %config.model,
            "Generating answer"
        );

        let raw = timeout(
            self.generation_timeout,
            self.generator
                .generate(&prompt, &config.model, config.temperature),
        )
        .await
        .map_err(|_| {
            Error::Timeout(format!(
                "Generation with {} timed out after {:?}",
                config.model, self.generation_timeout
            ))
        })?
        .inspect_err(|e| tracing::warn!(error = %e, model = %config.model, "Generation failed"))?;

        let parsed = parse_response(&raw);
        Ok(QueryAnswer {
            answer_text: parsed.answer,
            retrieved_chunks: retrieved,
            suggested_questions: parsed.suggestions,
        })
    }

    /// Delete a document and all of its chunks. Returns `false` for unknown ids.
    pub async fn delete_document(&self, doc_id: &str) -> Result<bool> {
        let guard = self.write_lock.lock().await;

        let Some((record, removed)) = self.remove(&guard, doc_id)? else {
            tracing::debug!(doc_id, "Delete requested for unknown document");
            return Ok(false);
        };

        if removed != record.chunk_count {
            tracing::warn!(
                doc_id,
                expected = record.chunk_count,
                removed,
                "Removed chunk count differs from the document record"
            );
        }

        tracing::info!(doc_id, filename = %record.filename, removed, "Document deleted");
        Ok(true)
    }

    /// Drop every document and chunk. Clearing an empty pipeline is a no-op.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.clear()?;
        self.registry.clear()?;
        tracing::info!("All documents cleared");
        Ok(())
    }

    pub fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        self.registry.list_all()
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.registry.stats()
    }

    /// Re-chunk and re-embed `sources` under the current configuration.
    ///
    /// Each source replaces the document named by its `doc_id`; sources
    /// without one are added. A source that fails leaves its previous
    /// document live and is reported. Documents not named by any source are
    /// kept. The writer lock is held for the whole pass, so concurrent
    /// ingestions and deletions wait for it to finish.
    pub async fn reindex(&self, sources: &[SourceDocument]) -> Result<ReindexReport> {
        let guard = self.write_lock.lock().await;
        let chunking = ChunkerConfig::from(&self.config.get()?);
        let mut report = ReindexReport::default();

        for source in sources {
            let outcome = match self
                .prepare(&source.text, &source.filename, source.file_type, chunking)
                .await
            {
                Ok(prepared) => self.replace(&guard, source.doc_id.as_deref(), prepared),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(record) => report.ingested.push(ReindexedDocument {
                    previous_id: source.doc_id.clone(),
                    record,
                }),
                Err(e) => {
                    tracing::warn!(
                        filename = %source.filename,
                        doc_id = ?source.doc_id,
                        error = %e,
                        "Re-ingestion failed; previous version kept"
                    );
                    report.failed.push(ReindexFailure {
                        filename: source.filename.clone(),
                        doc_id: source.doc_id.clone(),
                        reason: e.user_message(),
                    });
                }
            }
        }

        tracing::info!(
            ingested = report.ingested.len(),
            failed = report.failed.len(),
            "Reindex complete"
        );
        Ok(report)
    }
}
