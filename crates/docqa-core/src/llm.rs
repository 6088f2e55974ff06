//! Text generation trait and per-model capabilities

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Trait for the generative model collaborator.
///
/// Implementations map provider failures to
/// [`Error::Generation`](crate::Error::Generation) so callers can present a
/// categorized message.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str, model: &str, temperature: f32) -> Result<String>;
}

/// Quirks of a model family that change how a request has to be issued.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    pub requires_streaming: bool,
    pub requires_thinking_disabled: bool,
    pub min_temperature: f32,
}

impl ModelCapabilities {
    pub const DEFAULT: ModelCapabilities = ModelCapabilities {
        requires_streaming: false,
        requires_thinking_disabled: false,
        min_temperature: 0.0,
    };

    /// Look up the capabilities of `model` by name prefix.
    pub fn lookup(model: &str) -> ModelCapabilities {
        let model = model.trim().to_ascii_lowercase();
        MODEL_CAPABILITIES
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix))
            .map(|(_, caps)| *caps)
            .unwrap_or(Self::DEFAULT)
    }

    pub fn effective_temperature(&self, requested: f32) -> f32 {
        requested.max(self.min_temperature)
    }
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// First matching prefix wins, so more specific names go first.
const MODEL_CAPABILITIES: &[(&str, ModelCapabilities)] = &[
    (
        "qwq",
        ModelCapabilities {
            requires_streaming: true,
            requires_thinking_disabled: false,
            min_temperature: 0.0,
        },
    ),
    (
        "qwen3-",
        ModelCapabilities {
            requires_streaming: false,
            requires_thinking_disabled: true,
            min_temperature: 0.0,
        },
    ),
    (
        "deepseek-r1",
        ModelCapabilities {
            requires_streaming: true,
            requires_thinking_disabled: false,
            min_temperature: 0.0,
        },
    ),
    (
        "o1",
        ModelCapabilities {
            requires_streaming: false,
            requires_thinking_disabled: false,
            min_temperature: 1.0,
        },
    ),
    (
        "o3",
        ModelCapabilities {
            requires_streaming: false,
            requires_thinking_disabled: false,
            min_temperature: 1.0,
        },
    ),
    (
        "o4-mini",
        ModelCapabilities {
            requires_streaming: false,
            requires_thinking_disabled: false,
            min_temperature: 1.0,
        },
    ),
    (
        "kimi-k2",
        ModelCapabilities {
            requires_streaming: false,
            requires_thinking_disabled: false,
            min_temperature: 0.6,
        },
    ),
];
