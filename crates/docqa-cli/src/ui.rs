//! UI utilities for the CLI

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use docqa_core::{DocumentRecord, Error, QueryAnswer, RagConfig, Result, StoreStats};
use docqa_rag::ReindexReport;

const PROMPT: &str = "docqa>";
const PREVIEW_CHARS: usize = 160;

/// Display startup banner
pub fn display_banner() {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let title = "docqa - ask questions about your documents";
    println!(
        "{}{}{}{}",
        "│  ".blue(),
        title.blue().bold(),
        " ".repeat(banner_width.saturating_sub(title.chars().count() + 4)),
        "│".blue()
    );
    println!("{}", empty_line.blue());

    let feature_lines = [
        "• add <path> to ingest TXT or Markdown files",
        "• ask anything; answers cite the retrieved passages",
        "• ↑/↓ browse history, Esc clears the line",
        "",
        concat!("v", env!("CARGO_PKG_VERSION")),
    ];

    for line in feature_lines {
        if line.is_empty() {
            println!("{}", empty_line.blue());
            continue;
        }
        let padding = " ".repeat(banner_width.saturating_sub(line.chars().count() + 4));
        let text = if line.starts_with('v') {
            line.dimmed().to_string()
        } else {
            line.to_string()
        };
        println!("{}{}{}{}", "│  ".blue(), text, padding, "│".blue());
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!(
        "{}",
        "💡 Tip: type a question, or 'help' for commands".dimmed()
    );
    println!();
}

fn redraw(input: &str) -> io::Result<()> {
    print!(
        "\r{} {}  \r{} {}",
        PROMPT.green().bold(),
        " ".repeat(input.chars().count().max(50)),
        PROMPT.green().bold(),
        input
    );
    io::stdout().flush()
}

/// Handle input with command history navigation
pub async fn handle_input_with_history(history: &mut Vec<String>) -> Result<String> {
    // Piped input has no key events
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok("exit".to_string());
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(input);
    }

    enable_raw_mode()?;
    let result = read_line_raw(history);
    disable_raw_mode()?;
    println!();
    result
}

fn read_line_raw(history: &mut Vec<String>) -> Result<String> {
    let mut input = String::new();
    let mut history_index: Option<usize> = None;

    print!("{} ", PROMPT.green().bold());
    io::stdout().flush()?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        match key_event.code {
            KeyCode::Enter => {
                if !input.trim().is_empty() {
                    history.push(input.clone());
                }
                return Ok(input);
            }
            KeyCode::Char(c) => {
                input.push(c);
                redraw(&input)?;
            }
            KeyCode::Backspace => {
                if input.pop().is_some() {
                    redraw(&input)?;
                }
            }
            KeyCode::Up => {
                if !history.is_empty() {
                    let new_index = match history_index {
                        None => history.len() - 1,
                        Some(idx) => idx.saturating_sub(1),
                    };
                    history_index = Some(new_index);
                    input = history[new_index].clone();
                    redraw(&input)?;
                }
            }
            KeyCode::Down => {
                if let Some(idx) = history_index {
                    if idx + 1 < history.len() {
                        history_index = Some(idx + 1);
                        input = history[idx + 1].clone();
                    } else {
                        history_index = None;
                        input.clear();
                    }
                    redraw(&input)?;
                }
            }
            KeyCode::Esc => {
                history_index = None;
                input.clear();
                redraw(&input)?;
            }
            _ => {}
        }
    }
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Ingest one or more files", "add <path> [path ...]".green());
    println!("  {} - List ingested documents", "list".green());
    println!("  {} - Delete a document and its chunks", "delete <id>".green());
    println!("  {} - Remove every document", "clear".green());
    println!("  {} - Show document and chunk counts", "stats".green());
    println!("  {} - Show the retrieval settings", "config".green());
    println!(
        "  {} - Change settings (topK, chunkSize, chunkOverlap, model, temperature)",
        "config key=value ...".green()
    );
    println!("  {} - Re-chunk every document with the current settings", "reindex".green());
    println!("  {} - Ask using the k closest passages", "ask <k> <question>".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("{}", "Anything else is asked as a question, for example:".bold());
    println!("  What does the onboarding guide say about VPN access?");
    println!("  config chunkSize=800 chunkOverlap=80");
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

/// Print an answer with its sources and follow-up suggestions.
pub fn print_answer(answer: &QueryAnswer) {
    println!();
    println!("{}", answer.answer_text);

    if !answer.retrieved_chunks.is_empty() {
        println!();
        println!("{}", "Sources:".bold());
        for (i, retrieved) in answer.retrieved_chunks.iter().enumerate() {
            let chunk = &retrieved.chunk;
            println!(
                "  {} {} {} {}",
                format!("[{}]", i + 1).cyan(),
                chunk.source_filename.bold(),
                format!("section {}", chunk.sequence_index + 1).dimmed(),
                format!("score {:.3}", retrieved.score).dimmed()
            );
            println!("      {}", preview(&chunk.text).dimmed());
        }
    }

    if !answer.suggested_questions.is_empty() {
        println!();
        println!("{}", "You could also ask:".bold());
        for question in &answer.suggested_questions {
            println!("  {} {}", "→".green(), question);
        }
    }
    println!();
}

pub fn print_ingested(record: &DocumentRecord) {
    println!(
        "{} {} ({}, {} chunks) {}",
        "✅".green(),
        record.filename.bold(),
        record.file_type,
        record.chunk_count,
        record.id.dimmed()
    );
}

pub fn print_documents(documents: &[DocumentRecord]) {
    if documents.is_empty() {
        println!("{}", "No documents yet. Use 'add <path>' to ingest one.".dimmed());
        return;
    }

    for record in documents {
        println!(
            "  {}  {}  {}  {} chunks  {}",
            record.id.cyan(),
            record.filename.bold(),
            record.file_type,
            record.chunk_count,
            record
                .upload_time
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
    }
}

pub fn print_stats(stats: StoreStats) {
    println!(
        "{} documents, {} chunks",
        stats.document_count.to_string().bold(),
        stats.total_chunks.to_string().bold()
    );
}

pub fn print_config(config: &RagConfig) {
    println!("  {:<13} {}", "topK", config.top_k);
    println!("  {:<13} {}", "chunkSize", config.chunk_size);
    println!("  {:<13} {}", "chunkOverlap", config.chunk_overlap);
    println!("  {:<13} {}", "model", config.model);
    println!("  {:<13} {}", "temperature", config.temperature);
}

pub fn print_reindex(report: &ReindexReport) {
    println!(
        "{} Re-indexed {} documents",
        "🔄".cyan(),
        report.ingested.len()
    );
    for failure in &report.failed {
        println!(
            "  {} {}: {}",
            "⚠️".yellow(),
            failure.filename.bold(),
            failure.reason
        );
        if failure.doc_id.is_some() {
            println!("     {}", "previous version kept".dimmed());
        }
    }
}

pub fn print_error(error: &Error) {
    eprintln!("{} {}", "❌".red(), error.user_message().red());
}
