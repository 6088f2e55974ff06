//! Document records and store statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::FileType;

/// Metadata for one ingested source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub file_type: FileType,
    pub chunk_count: usize,
    pub upload_time: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a record with a freshly generated id, stamped with the current time.
    pub fn new(filename: impl Into<String>, file_type: FileType, chunk_count: usize) -> Self {
        Self {
            id: generate_document_id(),
            filename: filename.into(),
            file_type,
            chunk_count,
            upload_time: Utc::now(),
        }
    }
}

/// Aggregate counts over the live documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub total_chunks: usize,
}

/// Generate a document id: millisecond timestamp plus a random suffix.
pub fn generate_document_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("doc_{}_{}", Utc::now().timestamp_millis(), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_document_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_document_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.starts_with("doc_")));
    }
}
