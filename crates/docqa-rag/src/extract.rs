//! Plain-text extraction for text-like formats

use pulldown_cmark::{Event, Parser, TagEnd};

use docqa_core::{Error, Extractor, FileType, Result};

/// Extracts text from TXT, Markdown and UTF-8 files of unknown type.
///
/// Binary office formats need a dedicated parser and are rejected with
/// `ExtractionFailed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], file_type: FileType) -> Result<String> {
        match file_type {
            FileType::Txt | FileType::Unknown => decode_utf8(bytes),
            FileType::Markdown => Ok(markdown_to_text(&decode_utf8(bytes)?)),
            FileType::Pdf | FileType::Word | FileType::Excel => Err(Error::ExtractionFailed(
                format!("no {} parser is configured", file_type),
            )),
        }
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::ExtractionFailed(format!("file is not valid UTF-8 text: {}", e)))?;
    Ok(text.replace("\r\n", "\n"))
}

/// Render Markdown to plain text, keeping paragraph and line structure.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::Rule => text.push_str("\n\n"),
            Event::End(TagEnd::Item | TagEnd::List(_)) => text.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock) => {
                text.push_str("\n\n")
            }
            _ => {}
        }
    }

    collapse_blank_lines(text.trim())
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;

    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let text = PlainTextExtractor
            .extract(b"\xEF\xBB\xBFline one\r\nline two", FileType::Txt)
            .unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn test_markdown_is_flattened() {
        let md = "# Title\n\nSome *emphasis* and `code`.\n\n- first\n- second\n\n\n\nEnd.";
        let text = PlainTextExtractor.extract(md.as_bytes(), FileType::Markdown).unwrap();
        assert_eq!(text, "Title\n\nSome emphasis and code.\n\nfirst\nsecond\n\nEnd.");
    }

    #[test]
    fn test_binary_formats_fail() {
        for file_type in [FileType::Pdf, FileType::Word, FileType::Excel] {
            let err = PlainTextExtractor.extract(b"%PDF-1.7", file_type).unwrap_err();
            assert!(matches!(err, Error::ExtractionFailed(_)));
        }
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let err = PlainTextExtractor
            .extract(&[0xff, 0xfe, 0x00], FileType::Unknown)
            .unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }
}
