use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use docqa_cli::{Session, print_answer, print_error, print_ingested, run_repl};
use docqa_core::{RagConfig, RagConfigUpdate};
use docqa_openai::OpenAiClient;
use docqa_rag::RetrievalPipeline;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about your own documents", long_about = None)]
struct Cli {
    /// File to ingest at startup (repeatable)
    #[arg(short, long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Ask one question and exit
    #[arg(short, long)]
    ask: Option<String>,

    /// Generation model
    #[arg(short, long)]
    model: Option<String>,

    /// Number of passages retrieved per question
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Missing credentials stop us before anything is ingested
    let client = match OpenAiClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            print_error(&e);
            std::process::exit(2);
        }
    };

    let config = RagConfig::default().merge(&RagConfigUpdate {
        model: cli.model,
        top_k: cli.top_k,
        ..Default::default()
    })?;
    tracing::info!(
        model = %config.model,
        embedding_model = %client.config().embedding_model,
        "Starting docqa"
    );

    let pipeline = RetrievalPipeline::new(client.clone(), client, config)?;
    let mut session = Session::new(Arc::new(pipeline));

    for path in &cli.files {
        match session.add_file(path).await {
            Ok(record) => print_ingested(&record),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = ?e, "Ingestion failed");
                eprint!("{} ", path.display().to_string().bold());
                print_error(&e);
            }
        }
    }

    if let Some(question) = cli.ask {
        match session.ask(&question, None).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => {
                tracing::debug!(error = ?e, "Question failed");
                print_error(&e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    run_repl(&mut session).await?;
    Ok(())
}
