//! Retrieval configuration and its process-wide state holder

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::RwLock;

use crate::{Error, Result};

pub const TOP_K_RANGE: RangeInclusive<usize> = 1..=20;
pub const CHUNK_SIZE_RANGE: RangeInclusive<usize> = 100..=2000;
pub const CHUNK_OVERLAP_RANGE: RangeInclusive<usize> = 0..=500;
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// Tunables read by the chunker at ingestion time and by the pipeline at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub model: String,
    pub temperature: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            chunk_size: 500,
            chunk_overlap: 50,
            model: "qwen-plus".to_string(),
            temperature: 0.7,
        }
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RagConfigUpdate {
    pub top_k: Option<usize>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

impl RagConfig {
    /// Apply a partial update. Either every field is applied or, on any
    /// validation failure, none is.
    pub fn merge(&self, update: &RagConfigUpdate) -> Result<RagConfig> {
        let merged = RagConfig {
            top_k: update.top_k.unwrap_or(self.top_k),
            chunk_size: update.chunk_size.unwrap_or(self.chunk_size),
            chunk_overlap: update.chunk_overlap.unwrap_or(self.chunk_overlap),
            model: update
                .model
                .as_ref()
                .map(|m| m.trim().to_string())
                .unwrap_or_else(|| self.model.clone()),
            temperature: update.temperature.unwrap_or(self.temperature),
        };
        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<()> {
        if !TOP_K_RANGE.contains(&self.top_k) {
            return Err(Error::InvalidInput(format!(
                "topK must be within {}..={}, got {}",
                TOP_K_RANGE.start(),
                TOP_K_RANGE.end(),
                self.top_k
            )));
        }
        if !CHUNK_SIZE_RANGE.contains(&self.chunk_size) {
            return Err(Error::InvalidInput(format!(
                "chunkSize must be within {}..={}, got {}",
                CHUNK_SIZE_RANGE.start(),
                CHUNK_SIZE_RANGE.end(),
                self.chunk_size
            )));
        }
        if !CHUNK_OVERLAP_RANGE.contains(&self.chunk_overlap) {
            return Err(Error::InvalidInput(format!(
                "chunkOverlap must be within {}..={}, got {}",
                CHUNK_OVERLAP_RANGE.start(),
                CHUNK_OVERLAP_RANGE.end(),
                self.chunk_overlap
            )));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidInput(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(Error::InvalidInput(format!(
                "temperature must be within 0.0..=1.0, got {}",
                self.temperature
            )));
        }
        if self.model.trim().is_empty() {
            return Err(Error::InvalidInput("model must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Shared holder for the live [`RagConfig`].
#[derive(Debug, Default)]
pub struct ConfigState {
    inner: RwLock<RagConfig>,
}

impl ConfigState {
    pub fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: RwLock::new(config),
        })
    }

    /// Snapshot of the current configuration.
    pub fn get(&self) -> Result<RagConfig> {
        let config = self
            .inner
            .read()
            .map_err(|e| Error::Other(format!("Config lock error: {}", e)))?;
        Ok(config.clone())
    }

    /// Merge-update the configuration and return the new snapshot.
    pub fn update(&self, update: &RagConfigUpdate) -> Result<RagConfig> {
        let mut config = self
            .inner
            .write()
            .map_err(|e| Error::Other(format!("Config lock error: {}", e)))?;
        let merged = config.merge(update)?;
        *config = merged.clone();
        Ok(merged)
    }
}
