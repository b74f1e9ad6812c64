use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub feature_table: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub content_cache_age_sec: Option<usize>,
    pub frontend_dir_path: Option<String>,
    pub search_limit: Option<usize>,
    pub recommend_count: Option<usize>,
    pub http_timeout_sec: Option<u64>,

    // Sections
    pub spotify: Option<SpotifyConfig>,
    pub dialogue: Option<DialogueConfig>,
    pub bot: Option<BotConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SpotifyConfig {
    pub token_url: Option<String>,
    pub api_base: Option<String>,
    pub refresh_margin_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DialogueConfig {
    /// Generation backend: "huggingface" or "ollama"
    pub backend: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_length: Option<u32>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct BotConfig {
    pub api_base: Option<String>,
    pub poll_timeout_secs: Option<u64>,
    /// Where bot commands are answered: "local" or "rest"
    pub backend: Option<String>,
    pub rest_base_url: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
