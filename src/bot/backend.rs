//! Where bot commands get answered.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;
use std::time::Duration;

use super::commands::{format_track_list, usage, BotCommand, WELCOME_MESSAGE};
use crate::context::AppContext;
use crate::error::ServiceError;
use crate::recommend::TrackSummary;

#[async_trait]
pub trait BotBackend: Send + Sync {
    async fn search(&self, track_name: &str) -> Result<Vec<TrackSummary>, ServiceError>;
    async fn recommend(&self, track_name: &str) -> Result<Vec<TrackSummary>, ServiceError>;
    async fn chat(&self, text: &str) -> Result<String, ServiceError>;
}

/// Text sent back to the chat for `command`. Failures become their message.
pub async fn reply_for(backend: &dyn BotBackend, command: BotCommand) -> String {
    let result = match command {
        BotCommand::Start => Ok(WELCOME_MESSAGE.to_string()),
        BotCommand::MissingArgument(name) => Ok(usage(name)),
        BotCommand::Search(name) => backend
            .search(&name)
            .await
            .map(|tracks| list_or(&tracks, NO_TRACKS_MESSAGE)),
        BotCommand::Recommend(name) => backend
            .recommend(&name)
            .await
            .map(|tracks| list_or(&tracks, NO_SIMILAR_TRACKS_MESSAGE)),
        BotCommand::Chat(text) => backend.chat(&text).await,
    };
    result.unwrap_or_else(|e| e.to_string())
}

const NO_TRACKS_MESSAGE: &str = "No tracks found";
const NO_SIMILAR_TRACKS_MESSAGE: &str = "No similar tracks found";

// Telegram rejects empty messages.
fn list_or(tracks: &[TrackSummary], empty: &str) -> String {
    if tracks.is_empty() {
        empty.to_string()
    } else {
        format_track_list(tracks)
    }
}

/// Answers from the engine and pipeline of this process.
pub struct LocalBackend {
    context: Arc<AppContext>,
}

impl LocalBackend {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl BotBackend for LocalBackend {
    async fn search(&self, track_name: &str) -> Result<Vec<TrackSummary>, ServiceError> {
        self.context.engine.search(track_name)
    }

    async fn recommend(&self, track_name: &str) -> Result<Vec<TrackSummary>, ServiceError> {
        self.context
            .engine
            .recommend(track_name, self.context.recommend_count)
    }

    async fn chat(&self, text: &str) -> Result<String, ServiceError> {
        Ok(self.context.pipeline.respond(text).await?.reply)
    }
}

/// Answers by calling the REST endpoints of a running server.
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    chat_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

const SERVICE: &str = "chatbot-rest";

/// Upper bound for a `/chat` round trip unless told otherwise. The server may
/// wait on a slow generator for much longer than a search takes.
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(130);

impl RestBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }

    /// Overrides the client timeout for `/chat` requests only.
    pub fn with_chat_timeout(mut self, chat_timeout: Duration) -> Self {
        self.chat_timeout = chat_timeout;
        self
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| {
                ServiceError::upstream(SERVICE, format!("Malformed response: {}", e), false)
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(match status {
            StatusCode::BAD_REQUEST => ServiceError::Validation(message),
            StatusCode::NOT_FOUND => ServiceError::NotFound(message),
            _ => ServiceError::from_status(SERVICE, status, &message),
        })
    }

    async fn get_tracks(&self, path: &str, track_name: &str) -> Result<Vec<TrackSummary>, ServiceError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&[("track_name", track_name)])
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, &e))?;
        Self::decode(response).await
    }
}

#[async_trait]
impl BotBackend for RestBackend {
    async fn search(&self, track_name: &str) -> Result<Vec<TrackSummary>, ServiceError> {
        self.get_tracks("/search_track", track_name).await
    }

    async fn recommend(&self, track_name: &str) -> Result<Vec<TrackSummary>, ServiceError> {
        self.get_tracks("/recommend_track", track_name).await
    }

    async fn chat(&self, text: &str) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .timeout(self.chat_timeout)
            .json(&serde_json::json!({ "message": text }))
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(SERVICE, &e))?;
        let reply: ChatReplyBody = Self::decode(response).await?;
        Ok(reply.reply)
    }
}

#[derive(Debug, Deserialize)]
struct ChatReplyBody {
    reply: String,
}
