//! Hosted inference client for causal conversational models.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::DialogueGenerator;
use crate::error::ServiceError;
use crate::server::metrics;

pub const DEFAULT_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MODEL: &str = "microsoft/DialoGPT-medium";

/// End-of-sequence marker the model was trained with.
pub const EOS_TOKEN: &str = "<|endoftext|>";

const SERVICE: &str = "huggingface";

pub struct HuggingFaceGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
    max_length: u32,
    timeout: Duration,
}

impl HuggingFaceGenerator {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_token: Option<String>,
        max_length: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_token,
            max_length,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.model)
    }
}

/// Removes the echoed prompt and any special tokens from a raw generation.
pub fn extract_continuation(prompt: &str, generated: &str) -> String {
    let continuation = generated.strip_prefix(prompt).unwrap_or(generated);
    continuation.replace(EOS_TOKEN, "").trim().to_string()
}

#[async_trait]
impl DialogueGenerator for HuggingFaceGenerator {
    async fn generate(&self, text: &str) -> Result<String, ServiceError> {
        let prompt = format!("{}{}", text, EOS_TOKEN);
        let request = InferenceRequest {
            inputs: &prompt,
            parameters: InferenceParameters {
                max_length: self.max_length,
                return_full_text: true,
            },
        };

        debug!(model = %self.model, "Requesting dialogue generation");

        let mut builder = self
            .client
            .post(self.endpoint())
            .json(&request)
            .timeout(self.timeout);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            metrics::record_upstream_call(SERVICE, "error");
            ServiceError::from_reqwest(SERVICE, &e)
        })?;

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_call(SERVICE, "error");
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(SERVICE, status, &body));
        }

        let outputs: Vec<InferenceOutput> = response.json().await.map_err(|e| {
            metrics::record_upstream_call(SERVICE, "error");
            ServiceError::upstream(SERVICE, format!("Malformed generation response: {}", e), false)
        })?;
        metrics::record_upstream_call(SERVICE, "ok");

        let generated = outputs.into_iter().next().ok_or_else(|| {
            ServiceError::upstream(SERVICE, "Generation response was empty", false)
        })?;

        Ok(extract_continuation(&prompt, &generated.generated_text))
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct InferenceOutput {
    generated_text: String,
}
