//! Text extraction trait

use crate::{FileType, Result};

/// Converts raw file bytes into plain text.
///
/// Unparseable input must fail with
/// [`Error::ExtractionFailed`](crate::Error::ExtractionFailed).
pub trait Extractor: Send + Sync {
    fn extract(&self, bytes: &[u8], file_type: FileType) -> Result<String>;
}
