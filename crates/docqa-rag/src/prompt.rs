//! Prompt assembly and response parsing

use regex::Regex;
use std::sync::LazyLock;

use docqa_core::RetrievedChunk;

/// Token the model is asked to print between the answer and the follow-ups.
pub const FOLLOW_UP_SEPARATOR: &str = "---FOLLOW_UP_QUESTIONS---";
pub const MAX_SUGGESTIONS: usize = 3;
pub const MAX_SUGGESTION_CHARS: usize = 100;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+\s*[.)、:：]|[(（]\d+[)）]|[-*•·])\s*").expect("list marker pattern is valid")
});

/// Answer text and follow-up questions split out of a raw model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub answer: String,
    pub suggestions: Vec<String>,
}

/// Render retrieved chunks as a numbered context block.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    let mut context = String::new();

    for (i, retrieved) in chunks.iter().enumerate() {
        let chunk = &retrieved.chunk;
        context.push_str(&format!(
            "[Document {}] {} ({}), section {}, relevance {:.2}\n",
            i + 1,
            chunk.source_filename,
            chunk.file_type,
            chunk.sequence_index + 1,
            retrieved.score
        ));
        context.push_str(chunk.text.trim());
        context.push_str("\n\n");
    }

    context
}

/// Build the full generation prompt for `question` over `chunks`.
pub fn build_prompt(question: &str, chunks: &[RetrievedChunk]) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a document question-answering assistant. Answer the question using ONLY \
         the reference material below.\n\n",
    );
    prompt.push_str("Rules:\n");
    prompt.push_str("- If the material does not contain the answer, say that you cannot find it in the documents. Do not guess.\n");
    prompt.push_str("- Do not invent facts, numbers, names or sources that are not in the material.\n");
    prompt.push_str("- When you use a passage, mention which [Document N] it came from.\n");
    prompt.push_str("- Answer in the same language as the question.\n\n");

    prompt.push_str("Reference material:\n\n");
    prompt.push_str(&build_context(chunks));

    prompt.push_str("Question: ");
    prompt.push_str(question.trim());
    prompt.push_str("\n\n");

    prompt.push_str(&format!(
        "After the answer, print a line containing exactly {} and then exactly three short \
         follow-up questions the user could ask about these documents, one per line.\n",
        FOLLOW_UP_SEPARATOR
    ));

    prompt
}

/// Split a raw model response into the answer and at most three follow-ups.
///
/// Follow-up lines lose any leading list marker; empty lines and lines over
/// [`MAX_SUGGESTION_CHARS`] characters are dropped.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let Some((answer, tail)) = raw.split_once(FOLLOW_UP_SEPARATOR) else {
        return ParsedResponse {
            answer: raw.trim().to_string(),
            suggestions: Vec::new(),
        };
    };

    let suggestions = tail
        .lines()
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty() && line.chars().count() <= MAX_SUGGESTION_CHARS)
        .take(MAX_SUGGESTIONS)
        .collect();

    ParsedResponse {
        answer: answer.trim().to_string(),
        suggestions,
    }
}
