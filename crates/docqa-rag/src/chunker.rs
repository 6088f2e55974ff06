//! Recursive separator-based text chunker

use docqa_core::{Error, RagConfig, Result};

/// Separators tried in priority order: paragraph break, line break,
/// sentence-ending punctuation (Chinese then Latin), clause punctuation,
/// space, and finally the empty string (split between characters).
pub const DEFAULT_SEPARATORS: &[&str] = &[
    "\n\n", "\n", "。", "！", "？", ".", "!", "?", "；", ";", "，", ",", " ", "",
];

/// Size limits for one chunking pass, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl From<&RagConfig> for ChunkerConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

/// Splits text into chunks no longer than `chunk_size` characters.
///
/// Text is split recursively on the first separator that occurs in it; any
/// piece still too long is split again with the lower-priority separators.
/// The pieces are then merged greedily. When a chunk is closed at a boundary
/// below paragraph level, its last `chunk_overlap` characters are carried
/// into the next chunk as a prefix. The first separator in the list is the
/// paragraph boundary.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
    separators: Vec<String>,
}

#[derive(Debug)]
struct Piece<'a> {
    text: &'a str,
    len: usize,
    // Level of the separator that split this piece from the previous one.
    boundary: Option<usize>,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::InvalidInput("chunk size must be positive".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        Ok(Self {
            config,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the separator list. The character-level fallback is always
    /// applied after the last separator.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Split `text` into chunks. May return an empty list for blank input.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        self.split_recursive(text, 0, None, &mut pieces);
        self.merge(pieces)
    }

    fn split_recursive<'a>(
        &self,
        text: &'a str,
        level: usize,
        boundary: Option<usize>,
        out: &mut Vec<Piece<'a>>,
    ) {
        let len = text.chars().count();
        if len <= self.config.chunk_size {
            if len > 0 {
                out.push(Piece { text, len, boundary });
            }
            return;
        }

        let found = self
            .separators
            .iter()
            .enumerate()
            .skip(level)
            .find(|(_, sep)| sep.is_empty() || text.contains(sep.as_str()));

        let (sep_level, parts): (usize, Vec<&'a str>) = match found {
            Some((idx, sep)) if !sep.is_empty() => (idx, text.split_inclusive(sep.as_str()).collect()),
            Some((idx, _)) => (idx, char_slices(text)),
            None => (self.separators.len(), char_slices(text)),
        };

        for (i, part) in parts.into_iter().enumerate() {
            let part_boundary = if i == 0 { boundary } else { Some(sep_level) };
            self.split_recursive(part, sep_level + 1, part_boundary, out);
        }
    }

    fn merge(&self, pieces: Vec<Piece<'_>>) -> Vec<String> {
        let size = self.config.chunk_size;
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for piece in pieces {
            if current_len > 0 && current_len + piece.len > size {
                let carry = if piece.boundary == Some(0) {
                    ""
                } else {
                    tail_chars(&current, self.config.chunk_overlap.min(size - piece.len))
                };
                let carry = carry.to_string();

                push_chunk(&mut chunks, &current);
                current_len = carry.chars().count();
                current = carry;
            }

            current.push_str(piece.text);
            current_len += piece.len;
        }

        push_chunk(&mut chunks, &current);
        chunks
    }
}

/// Split `text` with a one-off chunker.
pub fn split(text: &str, config: ChunkerConfig) -> Result<Vec<String>> {
    Ok(Chunker::new(config)?.split(text))
}

fn push_chunk(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_slices(text: &str) -> Vec<&str> {
    text.char_indices()
        .map(|(i, c)| &text[i..i + c.len_utf8()])
        .collect()
}

fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &text[i..],
        None => text,
    }
}
