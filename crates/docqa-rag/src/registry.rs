//! Registry of ingested documents

use std::collections::HashMap;
use std::sync::RwLock;

use docqa_core::{ChunkId, DocumentRecord, Error, Result, StoreStats};

#[derive(Debug, Default)]
struct RegistryState {
    // Insertion order is the listing order.
    records: Vec<DocumentRecord>,
    chunk_index: HashMap<String, Vec<ChunkId>>,
}

/// One record per ingested document, plus the document → chunk identity
/// index used to decide what a deletion drops. The registry never owns the
/// chunks themselves; those live in the vector store.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    state: RwLock<RegistryState>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record together with the identities of the chunks committed
    /// for it. The id list must match the record's chunk count.
    pub fn record_ingestion(&self, record: DocumentRecord, chunk_ids: Vec<ChunkId>) -> Result<()> {
        if chunk_ids.len() != record.chunk_count {
            return Err(Error::InvalidInput(format!(
                "Document {} declares {} chunks but {} chunk ids were given",
                record.id,
                record.chunk_count,
                chunk_ids.len()
            )));
        }

        let mut state = self
            .state
            .write()
            .map_err(|e| Error::Other(format!("Registry lock error: {}", e)))?;

        if state.chunk_index.contains_key(&record.id) {
            return Err(Error::InvalidInput(format!(
                "Document {} is already registered",
                record.id
            )));
        }

        state.chunk_index.insert(record.id.clone(), chunk_ids);
        state.records.push(record);
        Ok(())
    }

    pub fn list_all(&self) -> Result<Vec<DocumentRecord>> {
        let state = self
            .state
            .read()
            .map_err(|e| Error::Other(format!("Registry lock error: {}", e)))?;
        Ok(state.records.clone())
    }

    pub fn get(&self, doc_id: &str) -> Result<Option<DocumentRecord>> {
        let state = self
            .state
            .read()
            .map_err(|e| Error::Other(format!("Registry lock error: {}", e)))?;
        Ok(state.records.iter().find(|r| r.id == doc_id).cloned())
    }

    /// Chunk identities recorded for `doc_id`; empty for unknown ids.
    pub fn chunk_ids(&self, doc_id: &str) -> Result<Vec<ChunkId>> {
        let state = self
            .state
            .read()
            .map_err(|e| Error::Other(format!("Registry lock error: {}", e)))?;
        Ok(state.chunk_index.get(doc_id).cloned().unwrap_or_default())
    }

    /// Remove a record. Unknown ids are a no-op and return `None`.
    pub fn remove(&self, doc_id: &str) -> Result<Option<DocumentRecord>> {
        let mut state = self
            .state
            .write()
            .map_err(|e| Error::Other(format!("Registry lock error: {}", e)))?;

        state.chunk_index.remove(doc_id);
        let position = state.records.iter().position(|r| r.id == doc_id);
        Ok(position.map(|i| state.records.remove(i)))
    }

    pub fn clear(&self) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|e| Error::Other(format!("Registry lock error: {}", e)))?;
        *state = RegistryState::default();
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let state = self
            .state
            .read()
            .map_err(|e| Error::Other(format!("Registry lock error: {}", e)))?;
        Ok(StoreStats {
            document_count: state.records.len(),
            total_chunks: state.records.iter().map(|r| r.chunk_count).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::FileType;

    fn record(registry: &DocumentRegistry, filename: &str, chunks: usize) -> DocumentRecord {
        let record = DocumentRecord::new(filename, FileType::from_filename(filename), chunks);
        let ids = (0..chunks).map(|i| ChunkId::new(&record.id, i)).collect();
        registry.record_ingestion(record.clone(), ids).unwrap();
        record
    }

    #[test]
    fn test_record_and_stats() {
        let registry = DocumentRegistry::new();
        let a = record(&registry, "a.pdf", 3);
        let b = record(&registry, "b.md", 4);

        assert_ne!(a.id, b.id);
        assert_eq!(
            registry.stats().unwrap(),
            StoreStats { document_count: 2, total_chunks: 7 }
        );
        assert_eq!(registry.list_all().unwrap(), vec![a.clone(), b.clone()]);
        assert_eq!(
            registry.chunk_ids(&a.id).unwrap(),
            vec![
                ChunkId::new(&a.id, 0),
                ChunkId::new(&a.id, 1),
                ChunkId::new(&a.id, 2)
            ]
        );

        let removed = registry.remove(&a.id).unwrap();
        assert_eq!(removed, Some(a.clone()));
        assert_eq!(
            registry.stats().unwrap(),
            StoreStats { document_count: 1, total_chunks: 4 }
        );
        assert!(registry.chunk_ids(&a.id).unwrap().is_empty());
        assert_eq!(registry.get(&b.id).unwrap(), Some(b));
    }

    #[test]
    fn test_chunk_id_count_must_match() {
        let registry = DocumentRegistry::new();
        let doc = DocumentRecord::new("a.txt", FileType::Txt, 2);
        let ids = vec![ChunkId::new(&doc.id, 0)];

        assert!(matches!(
            registry.record_ingestion(doc, ids),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(registry.stats().unwrap(), StoreStats::default());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let registry = DocumentRegistry::new();
        record(&registry, "a.txt", 1);
        assert_eq!(registry.remove("doc_missing").unwrap(), None);
        assert_eq!(registry.stats().unwrap().document_count, 1);
    }

    #[test]
    fn test_duplicate_record_rejected() {
        let registry = DocumentRegistry::new();
        let doc = record(&registry, "a.txt", 1);
        let ids = vec![ChunkId::new(&doc.id, 0)];
        assert!(registry.record_ingestion(doc, ids).is_err());
    }

    #[test]
    fn test_clear_twice() {
        let registry = DocumentRegistry::new();
        record(&registry, "a.txt", 2);
        registry.clear().unwrap();
        registry.clear().unwrap();
        assert_eq!(registry.stats().unwrap(), StoreStats::default());
        assert!(registry.list_all().unwrap().is_empty());
    }
}
