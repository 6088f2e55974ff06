//! Interactive CLI for docqa

mod commands;
mod session;
mod ui;

#[cfg(test)]
mod tests;

pub use commands::{ReplCommand, parse_command};
pub use session::{Flow, Session, run_repl};
pub use ui::{
    display_banner, handle_input_with_history, print_answer, print_config, print_documents,
    print_error, print_help, print_ingested, print_reindex, print_stats,
};

// Re-export core types
pub use docqa_core::{Error, Result};
