//! Deterministic collaborators for tests

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use docqa_core::{EmbeddingProvider, Error, GenerationFailure, Generator, Result};

/// Words the [`KeywordEmbedder`] counts, one dimension each.
pub const KEYWORDS: &[&str] = &["alpha", "bravo", "charlie", "delta", "fox", "dog"];

/// Embeds a text as `[1.0, count(keyword_0), count(keyword_1), ...]`.
/// The constant first component keeps every vector non-zero.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        std::iter::once(1.0)
            .chain(KEYWORDS.iter().map(|k| lower.matches(k).count() as f32))
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn model_id(&self) -> &str {
        "keyword-count"
    }
}

/// Returns `[n, 1.0]` for an input `item-<n>` and records every request.
#[derive(Default)]
pub struct TaggedEmbedder {
    batches: Mutex<Vec<Vec<String>>>,
}

impl TaggedEmbedder {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(|b| b.len()).collect()
    }

    pub fn seen_texts(&self) -> Vec<String> {
        self.batches.lock().unwrap().concat()
    }
}

#[async_trait]
impl EmbeddingProvider for TaggedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.lock().unwrap().push(texts.to_vec());
        Ok(texts
            .iter()
            .map(|t| {
                let tag = t
                    .strip_prefix("item-")
                    .and_then(|n| n.parse::<f32>().ok())
                    .unwrap_or(-1.0);
                vec![tag, 1.0]
            })
            .collect())
    }

    fn model_id(&self) -> &str {
        "tagged"
    }
}

/// Succeeds with keyword vectors until call number `fail_on` (1-based).
pub struct FailingEmbedder {
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn failing_on_call(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always() -> Self {
        Self::failing_on_call(1)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.fail_on {
            return Err(Error::Network("connection reset by peer".to_string()));
        }
        Ok(texts.iter().map(|t| KeywordEmbedder::vector_for(t)).collect())
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

pub struct SlowEmbedder {
    delay: Duration,
}

impl SlowEmbedder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(self.delay).await;
        Ok(texts.iter().map(|t| KeywordEmbedder::vector_for(t)).collect())
    }

    fn model_id(&self) -> &str {
        "slow"
    }
}

/// Returns a fixed response and remembers the prompts it was given.
pub struct ScriptedGenerator {
    response: String,
    prompts: Mutex<Vec<(String, String, f32)>>,
}

impl ScriptedGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().map(|(p, _, _)| p.clone())
    }

    pub fn last_model(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().map(|(_, m, _)| m.clone())
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new("The answer.")
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, model: &str, temperature: f32) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), model.to_string(), temperature));
        Ok(self.response.clone())
    }
}

pub struct RateLimitedGenerator;

#[async_trait]
impl Generator for RateLimitedGenerator {
    async fn generate(&self, _prompt: &str, _model: &str, _temperature: f32) -> Result<String> {
        Err(Error::Generation(GenerationFailure::RateLimited(
            "status 429: slow down".to_string(),
        )))
    }
}
