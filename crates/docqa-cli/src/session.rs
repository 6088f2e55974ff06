//! Interactive session state and the REPL loop

use colored::*;
use std::path::Path;
use std::sync::Arc;

use docqa_core::{DocumentRecord, EmbeddingProvider, Error, Generator, QueryAnswer, Result};
use docqa_rag::{ReindexReport, RetrievalPipeline, SourceDocument};

use crate::commands::{ReplCommand, parse_command};
use crate::ui;

/// Whether the REPL should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A pipeline plus the extracted text of every live document, kept so that
/// `reindex` can re-chunk documents without reading the files again.
pub struct Session<P: EmbeddingProvider, G: Generator> {
    pipeline: Arc<RetrievalPipeline<P, G>>,
    sources: Vec<SourceDocument>,
    history: Vec<String>,
}

impl<P: EmbeddingProvider, G: Generator> Session<P, G> {
    pub fn new(pipeline: Arc<RetrievalPipeline<P, G>>) -> Self {
        Self {
            pipeline,
            sources: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn pipeline(&self) -> &RetrievalPipeline<P, G> {
        &self.pipeline
    }

    /// Read, extract and ingest a file from disk.
    pub async fn add_file(&mut self, path: &Path) -> Result<DocumentRecord> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidInput(format!("{} is not a file", path.display())))?;

        let bytes = tokio::fs::read(path).await?;
        let source = self.pipeline.extract(&bytes, &filename)?;
        let record = self.pipeline.ingest_source(&source).await?;

        self.sources.push(source.with_doc_id(record.id.clone()));
        Ok(record)
    }

    pub async fn delete(&mut self, doc_id: &str) -> Result<bool> {
        let deleted = self.pipeline.delete_document(doc_id).await?;
        self.sources
            .retain(|source| source.doc_id.as_deref() != Some(doc_id));
        Ok(deleted)
    }

    pub async fn clear(&mut self) -> Result<()> {
        self.pipeline.clear().await?;
        self.sources.clear();
        Ok(())
    }

    /// Re-ingest every live document with the current configuration.
    /// Documents that fail keep their previous version and id.
    pub async fn reindex(&mut self) -> Result<ReindexReport> {
        let report = self.pipeline.reindex(&self.sources).await?;

        for rebuilt in &report.ingested {
            if let Some(source) = self
                .sources
                .iter_mut()
                .find(|source| source.doc_id.is_some() && source.doc_id == rebuilt.previous_id)
            {
                source.doc_id = Some(rebuilt.record.id.clone());
            }
        }

        Ok(report)
    }

    pub async fn ask(&self, question: &str, top_k: Option<usize>) -> Result<QueryAnswer> {
        self.pipeline.answer(question, top_k).await
    }

    /// Execute one command, printing its result.
    pub async fn execute(&mut self, command: ReplCommand) -> Result<Flow> {
        tracing::debug!(?command, "Executing command");

        match command {
            ReplCommand::Add(paths) => {
                for path in paths {
                    match self.add_file(&path).await {
                        Ok(record) => ui::print_ingested(&record),
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "Ingestion failed");
                            eprint!("{} ", path.display().to_string().bold());
                            ui::print_error(&e);
                        }
                    }
                }
            }
            ReplCommand::List => ui::print_documents(&self.pipeline.list_documents()?),
            ReplCommand::Delete(doc_id) => {
                if self.delete(&doc_id).await? {
                    println!("{} Deleted {}", "🗑️".yellow(), doc_id);
                } else {
                    println!("{}", format!("No document with id {}", doc_id).dimmed());
                }
            }
            ReplCommand::Clear => {
                self.clear().await?;
                println!("{} All documents removed", "🗑️".yellow());
            }
            ReplCommand::Stats => ui::print_stats(self.pipeline.stats()?),
            ReplCommand::ShowConfig => ui::print_config(&self.pipeline.config()?),
            ReplCommand::SetConfig(update) => {
                let config = self.pipeline.update_config(&update)?;
                ui::print_config(&config);
                if update.chunk_size.is_some() || update.chunk_overlap.is_some() {
                    println!(
                        "{}",
                        "Chunking changes apply to new documents; run 'reindex' to re-chunk existing ones."
                            .dimmed()
                    );
                }
            }
            ReplCommand::Reindex => ui::print_reindex(&self.reindex().await?),
            ReplCommand::Ask { question, top_k } => {
                println!("{}", "Thinking...".dimmed());
                ui::print_answer(&self.ask(&question, top_k).await?);
            }
            ReplCommand::Help => ui::print_help(),
            ReplCommand::Exit => return Ok(Flow::Exit),
        }

        Ok(Flow::Continue)
    }

    /// Parse and execute one line; errors are printed, not returned.
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                ui::print_error(&e);
                return Flow::Continue;
            }
        };

        match self.execute(command).await {
            Ok(flow) => flow,
            Err(e) => {
                tracing::debug!(error = ?e, "Command failed");
                ui::print_error(&e);
                Flow::Continue
            }
        }
    }
}

/// Run the interactive loop until `exit` or end of input.
pub async fn run_repl<P: EmbeddingProvider, G: Generator>(session: &mut Session<P, G>) -> Result<()> {
    ui::display_banner();

    loop {
        let mut history = std::mem::take(&mut session.history);
        let line = ui::handle_input_with_history(&mut history).await;
        session.history = history;

        if session.handle_line(&line?).await == Flow::Exit {
            println!("{}", "Goodbye! 👋".green());
            return Ok(());
        }
    }
}
