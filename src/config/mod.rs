mod cli_args;
mod file_config;

pub use cli_args::ConfigArgs;
pub use file_config::{BotConfig, DialogueConfig, FileConfig, SpotifyConfig};

use crate::auth::DEFAULT_TOKEN_URL;
use crate::catalog_client::DEFAULT_API_BASE;
use crate::dialogue::{DEFAULT_INFERENCE_BASE, DEFAULT_MODEL};
use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub feature_table: Option<String>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub search_limit: usize,
    pub recommend_count: usize,
    pub http_timeout_sec: u64,
    pub dialogue_backend: Option<DialogueBackend>,
    pub bot_backend: Option<BotBackendKind>,
}

/// Credentials read from the environment, never from files.
#[derive(Clone)]
pub struct Secrets {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub hf_token: Option<String>,
    pub telegram_bot_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("spotify_client_id", &self.spotify_client_id)
            .field("spotify_client_secret", &"<redacted>")
            .field("hf_token", &self.hf_token.as_ref().map(|_| "<redacted>"))
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the secrets from any key lookup. Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow!("Environment variable {} must be set", key))
        };

        Ok(Self {
            spotify_client_id: required("SPOTIFY_CLIENT_ID")?,
            spotify_client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            hf_token: get("HF_TOKEN"),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DialogueBackend {
    #[default]
    #[value(name = "huggingface")]
    HuggingFace,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BotBackendKind {
    /// Answer from the in-process engine and pipeline
    #[default]
    Local,
    /// Answer by calling the REST endpoints
    Rest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureTableSource {
    Path(PathBuf),
    Url(String),
}

impl FeatureTableSource {
    fn parse(raw: &str) -> Result<Self> {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(FeatureTableSource::Url(raw.to_string()));
        }
        let path = PathBuf::from(raw);
        if !path.exists() {
            bail!("Feature table file does not exist: {:?}", path);
        }
        if !path.is_file() {
            bail!("Feature table is not a file: {:?}", path);
        }
        Ok(FeatureTableSource::Path(path))
    }
}

#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub token_url: String,
    pub api_base: String,
    pub refresh_margin_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DialogueSettings {
    pub backend: DialogueBackend,
    pub model: String,
    pub base_url: String,
    pub max_length: u32,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub api_base: String,
    pub poll_timeout_secs: u64,
    pub backend: BotBackendKind,
    pub rest_base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub feature_table: FeatureTableSource,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub search_limit: usize,
    pub recommend_count: usize,
    pub http_timeout_sec: u64,

    pub spotify: SpotifySettings,
    pub dialogue: DialogueSettings,
    pub bot: BotSettings,

    pub secrets: Secrets,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>, secrets: Secrets) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let feature_table = file
            .feature_table
            .or_else(|| cli.feature_table.clone())
            .ok_or_else(|| {
                anyhow!("feature_table must be specified via --feature-table or in config file")
            })?;
        let feature_table = FeatureTableSource::parse(&feature_table)?;

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let search_limit = file.search_limit.unwrap_or(cli.search_limit);
        let recommend_count = file.recommend_count.unwrap_or(cli.recommend_count);
        if search_limit == 0 || recommend_count == 0 {
            bail!("search_limit and recommend_count must be greater than zero");
        }
        let http_timeout_sec = file.http_timeout_sec.unwrap_or(cli.http_timeout_sec);

        let spotify_file = file.spotify.unwrap_or_default();
        let spotify = SpotifySettings {
            token_url: spotify_file
                .token_url
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_base: spotify_file
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            refresh_margin_secs: spotify_file.refresh_margin_secs.unwrap_or(60),
        };

        let dialogue_file = file.dialogue.unwrap_or_default();
        let backend = match dialogue_file.backend.as_deref() {
            Some(s) => DialogueBackend::from_str(s, true)
                .map_err(|_| anyhow!("Unknown dialogue backend: {}", s))?,
            None => cli.dialogue_backend.unwrap_or_default(),
        };
        let (default_model, default_base_url) = match backend {
            DialogueBackend::HuggingFace => (DEFAULT_MODEL, DEFAULT_INFERENCE_BASE),
            DialogueBackend::Ollama => (DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL),
        };
        let dialogue = DialogueSettings {
            backend,
            model: dialogue_file
                .model
                .unwrap_or_else(|| default_model.to_string()),
            base_url: dialogue_file
                .base_url
                .unwrap_or_else(|| default_base_url.to_string()),
            max_length: dialogue_file.max_length.unwrap_or(1000),
            timeout_sec: dialogue_file.timeout_sec.unwrap_or(120),
        };

        let bot_file = file.bot.unwrap_or_default();
        let bot_backend = match bot_file.backend.as_deref() {
            Some(s) => BotBackendKind::from_str(s, true)
                .map_err(|_| anyhow!("Unknown bot backend: {}", s))?,
            None => cli.bot_backend.unwrap_or_default(),
        };
        let bot = BotSettings {
            api_base: bot_file
                .api_base
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API.to_string()),
            poll_timeout_secs: bot_file.poll_timeout_secs.unwrap_or(30),
            backend: bot_backend,
            rest_base_url: bot_file
                .rest_base_url
                .unwrap_or_else(|| format!("http://127.0.0.1:{}", port)),
        };

        Ok(Self {
            feature_table,
            port,
            logging_level,
            content_cache_age_sec,
            frontend_dir_path,
            search_limit,
            recommend_count,
            http_timeout_sec,
            spotify,
            dialogue,
            bot,
            secrets,
        })
    }

    pub fn bot_enabled(&self) -> bool {
        self.secrets.telegram_bot_token.is_some()
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
