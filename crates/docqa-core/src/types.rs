//! Common types used across the docqa system

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Source document format, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Word,
    Excel,
    Markdown,
    Txt,
    Unknown,
}

impl FileType {
    /// Detect the file type from a file name's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => FileType::Pdf,
            Some("doc") | Some("docx") => FileType::Word,
            Some("xls") | Some("xlsx") | Some("csv") => FileType::Excel,
            Some("md") | Some("markdown") => FileType::Markdown,
            Some("txt") | Some("text") => FileType::Txt,
            _ => FileType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "PDF",
            FileType::Word => "Word",
            FileType::Excel => "Excel",
            FileType::Markdown => "Markdown",
            FileType::Txt => "TXT",
            FileType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a chunk inside the vector store: `<doc id>#<sequence index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn new(doc_id: &str, sequence_index: usize) -> Self {
        Self(format!("{}#{}", doc_id, sequence_index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A text segment of an ingested document. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_doc_id: String,
    pub source_filename: String,
    pub file_type: FileType,
    pub sequence_index: usize,
}

impl Chunk {
    pub fn id(&self) -> ChunkId {
        ChunkId::new(&self.source_doc_id, self.sequence_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_filename("report.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.docx"), FileType::Word);
        assert_eq!(FileType::from_filename("sheet.xlsx"), FileType::Excel);
        assert_eq!(FileType::from_filename("README.md"), FileType::Markdown);
        assert_eq!(FileType::from_filename("a/b/plain.txt"), FileType::Txt);
        assert_eq!(FileType::from_filename("archive.tar.gz"), FileType::Unknown);
        assert_eq!(FileType::from_filename("Makefile"), FileType::Unknown);
    }

    #[test]
    fn test_chunk_id() {
        let chunk = Chunk {
            text: "hello".to_string(),
            source_doc_id: "doc_1".to_string(),
            source_filename: "a.txt".to_string(),
            file_type: FileType::Txt,
            sequence_index: 3,
        };
        assert_eq!(chunk.id().as_str(), "doc_1#3");
        assert_eq!(chunk.id(), ChunkId::new("doc_1", 3));
    }
}
