//! REPL command parsing

use serde_json::{Map, Value};
use std::path::PathBuf;

use docqa_core::{Error, RagConfigUpdate, Result};

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Add(Vec<PathBuf>),
    List,
    Delete(String),
    Clear,
    Stats,
    ShowConfig,
    SetConfig(RagConfigUpdate),
    Reindex,
    Ask {
        question: String,
        top_k: Option<usize>,
    },
    Help,
    Exit,
}

/// Parse a line of input. Blank lines yield `None`; anything that is not a
/// command is treated as a question.
pub fn parse_command(input: &str) -> Result<Option<ReplCommand>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let (head, rest) = match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    };

    let command = match head.to_lowercase().as_str() {
        "add" => {
            if rest.is_empty() {
                return Err(usage("add <path> [path ...]"));
            }
            ReplCommand::Add(rest.split_whitespace().map(PathBuf::from).collect())
        }
        "list" | "ls" if rest.is_empty() => ReplCommand::List,
        "delete" | "rm" => {
            if rest.is_empty() || rest.contains(char::is_whitespace) {
                return Err(usage("delete <document-id>"));
            }
            ReplCommand::Delete(rest.to_string())
        }
        "clear" if rest.is_empty() => ReplCommand::Clear,
        "stats" if rest.is_empty() => ReplCommand::Stats,
        "config" if rest.is_empty() => ReplCommand::ShowConfig,
        "config" => ReplCommand::SetConfig(parse_config_update(rest)?),
        "reindex" if rest.is_empty() => ReplCommand::Reindex,
        "ask" => parse_ask(rest)?,
        "help" | "?" if rest.is_empty() => ReplCommand::Help,
        "exit" | "quit" if rest.is_empty() => ReplCommand::Exit,
        _ => ReplCommand::Ask {
            question: input.to_string(),
            top_k: None,
        },
    };

    Ok(Some(command))
}

fn parse_ask(rest: &str) -> Result<ReplCommand> {
    let (k, question) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| usage("ask <k> <question>"))?;
    let top_k = k
        .parse::<usize>()
        .map_err(|_| usage("ask <k> <question>"))?;

    Ok(ReplCommand::Ask {
        question: question.trim().to_string(),
        top_k: Some(top_k),
    })
}

/// Parse `key=value` pairs into a partial config update. Keys use the
/// camelCase config names; values are read as JSON numbers where possible.
pub fn parse_config_update(args: &str) -> Result<RagConfigUpdate> {
    let mut fields = Map::new();

    for pair in args.split_whitespace() {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| usage("config [key=value ...]"))?;
        if key.is_empty() || value.is_empty() {
            return Err(usage("config [key=value ...]"));
        }

        let value = match key {
            "model" => Value::String(value.to_string()),
            _ => serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string())),
        };
        fields.insert(key.to_string(), value);
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| Error::InvalidInput(format!("Invalid config update: {}", e)))
}

fn usage(form: &str) -> Error {
    Error::InvalidInput(format!("usage: {}", form))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ReplCommand {
        parse_command(input).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("list"), ReplCommand::List);
        assert_eq!(parse("STATS"), ReplCommand::Stats);
        assert_eq!(parse("clear"), ReplCommand::Clear);
        assert_eq!(parse("config"), ReplCommand::ShowConfig);
        assert_eq!(parse("reindex"), ReplCommand::Reindex);
        assert_eq!(parse("help"), ReplCommand::Help);
        assert_eq!(parse("quit"), ReplCommand::Exit);
        assert_eq!(
            parse("delete doc_1_abc"),
            ReplCommand::Delete("doc_1_abc".to_string())
        );
        assert_eq!(
            parse("add a.txt  notes/b.md"),
            ReplCommand::Add(vec![PathBuf::from("a.txt"), PathBuf::from("notes/b.md")])
        );
    }

    #[test]
    fn test_questions() {
        assert_eq!(
            parse("What does the fox do?"),
            ReplCommand::Ask {
                question: "What does the fox do?".to_string(),
                top_k: None
            }
        );
        // A command word followed by text is a question, not a command.
        assert_eq!(
            parse("list the main risks"),
            ReplCommand::Ask {
                question: "list the main risks".to_string(),
                top_k: None
            }
        );
        assert_eq!(
            parse("ask 3 Who wrote it?"),
            ReplCommand::Ask {
                question: "Who wrote it?".to_string(),
                top_k: Some(3)
            }
        );
    }

    #[test]
    fn test_config_update() {
        let update = parse_config_update("topK=8 temperature=0.2 model=qwen-max").unwrap();
        assert_eq!(update.top_k, Some(8));
        assert_eq!(update.temperature, Some(0.2));
        assert_eq!(update.model.as_deref(), Some("qwen-max"));
        assert_eq!(update.chunk_size, None);
    }

    #[test]
    fn test_invalid_input() {
        for input in [
            "add",
            "delete",
            "delete a b",
            "ask three why?",
            "ask 3",
            "config topK",
            "config bogus=1",
            "config topK=lots",
        ] {
            assert!(
                matches!(parse_command(input), Err(Error::InvalidInput(_))),
                "{}",
                input
            );
        }
    }
}
