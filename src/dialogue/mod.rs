//! Open-domain reply generation.
//!
//! Generation is stateless: each call sees only the text it is given.

mod huggingface;
mod ollama;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::ServiceError;

pub use huggingface::{
    extract_continuation, HuggingFaceGenerator, DEFAULT_INFERENCE_BASE, DEFAULT_MODEL, EOS_TOKEN,
};
pub use ollama::{Completion, CompletionOptions, LlmError, LlmProvider, OllamaProvider};

#[async_trait]
pub trait DialogueGenerator: Send + Sync {
    async fn generate(&self, text: &str) -> Result<String, ServiceError>;
}

/// Generator backed by any chat-completion [`LlmProvider`].
pub struct LlmDialogueGenerator {
    provider: Arc<dyn LlmProvider>,
    options: CompletionOptions,
}

impl LlmDialogueGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, max_tokens: u32) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                max_tokens,
                ..CompletionOptions::default()
            },
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }
}

#[async_trait]
impl DialogueGenerator for LlmDialogueGenerator {
    async fn generate(&self, text: &str) -> Result<String, ServiceError> {
        let completion = self.provider.complete(text, &self.options).await?;
        if completion.truncated {
            debug!(model = %self.provider.model(), "Reply cut at the token limit");
        }
        Ok(completion.text.trim().to_string())
    }
}
