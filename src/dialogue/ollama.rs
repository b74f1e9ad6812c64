//! Chat-completion backends. A local Ollama server is the one implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::error::ServiceError;
use crate::server::metrics;

const SERVICE: &str = "ollama";

#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("server unreachable: {0}")]
    Unreachable(String),

    #[error("timed out")]
    TimedOut,

    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed reply: {0}")]
    Malformed(String),

    #[error("model '{0}' is not installed")]
    ModelMissing(String),
}

impl LlmError {
    fn is_transient(&self) -> bool {
        match self {
            LlmError::Unreachable(_) | LlmError::TimedOut => true,
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            LlmError::Malformed(_) | LlmError::ModelMissing(_) => false,
        }
    }
}

impl From<LlmError> for ServiceError {
    fn from(err: LlmError) -> Self {
        let retryable = err.is_transient();
        ServiceError::upstream(SERVICE, err.to_string(), retryable)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::TimedOut
        } else {
            LlmError::Unreachable(e.to_string())
        }
    }
}

/// Generated text for a single prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Generation stopped at `max_tokens`.
    pub truncated: bool,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn model(&self) -> &str;

    /// Answers `prompt` with no prior context.
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError>;

    /// Checks that the server answers and has the configured model.
    async fn health_check(&self) -> Result<(), LlmError>;
}

pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(client: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn chat_request<'a>(&'a self, prompt: &'a str, options: &CompletionOptions) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ModelOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        debug!(model = %self.model, "Requesting completion");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&self.chat_request(prompt, options))
            .timeout(options.timeout)
            .send()
            .await
            .inspect_err(|_| metrics::record_upstream_call(SERVICE, "error"))?;

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_call(SERVICE, "error");
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await.map_err(|e| {
            metrics::record_upstream_call(SERVICE, "error");
            LlmError::Malformed(e.to_string())
        })?;
        metrics::record_upstream_call(SERVICE, "ok");

        Ok(Completion {
            text: reply.message.content,
            truncated: reply.done_reason.as_deref() == Some("length"),
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        if tags.models.iter().any(|m| m.name == self.model) {
            Ok(())
        } else {
            Err(LlmError::ModelMissing(self.model.clone()))
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    options: ModelOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ModelOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ReplyMessage,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<InstalledModel>,
}

#[derive(Debug, Deserialize)]
struct InstalledModel {
    name: String,
}
