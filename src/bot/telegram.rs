//! Minimal Telegram Bot API client: long polling and plain text replies.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::ServiceError;
use crate::server::metrics;

const SERVICE: &str = "telegram";

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

pub struct TelegramClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TelegramClient {
    pub fn new(client: reqwest::Client, api_base: &str, token: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        }
    }

    fn unwrap_result<T>(response: ApiResponse<T>) -> Result<T, ServiceError> {
        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(ServiceError::upstream(
                SERVICE,
                response
                    .description
                    .unwrap_or_else(|| "request was not ok".to_string()),
                false,
            )),
        }
    }

    /// Waits up to `timeout` for updates newer than `offset`.
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, ServiceError> {
        let response = self
            .client
            .get(format!("{}/getUpdates", self.endpoint))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", timeout.as_secs().to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ])
            // The server holds the request open for up to `timeout`.
            .timeout(timeout + Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, &e))?;

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_call(SERVICE, "error");
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(SERVICE, status, &body));
        }

        let body: ApiResponse<Vec<Update>> = response.json().await.map_err(|e| {
            ServiceError::upstream(SERVICE, format!("Malformed updates: {}", e), false)
        })?;
        let updates = Self::unwrap_result(body)?;
        metrics::record_upstream_call(SERVICE, "ok");
        debug!("Received {} updates", updates.len());
        Ok(updates)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(format!("{}/sendMessage", self.endpoint))
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(|e| {
                metrics::record_upstream_call(SERVICE, "error");
                ServiceError::from_reqwest(SERVICE, &e)
            })?;

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_call(SERVICE, "error");
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(SERVICE, status, &body));
        }
        metrics::record_upstream_call(SERVICE, "ok");
        Ok(())
    }
}

/// Offset to request next so already handled updates aren't delivered again.
pub fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map_or(current, |next| next.max(current))
}
