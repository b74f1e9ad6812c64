use clap::Args;
use std::path::PathBuf;

use super::{BotBackendKind, CliConfig, DialogueBackend};
use crate::server::RequestsLoggingLevel;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path))
}

/// Command line options shared by the binaries.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// CSV feature table, as a file path or an http(s) URL.
    /// Can also be specified in config file.
    #[clap(long)]
    pub feature_table: Option<String>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 5000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of search and recommendation responses in the cache, in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Maximum number of rows returned by a track search.
    #[clap(long, default_value_t = 20)]
    pub search_limit: usize,

    /// Number of recommendations returned per query.
    #[clap(long, default_value_t = 5)]
    pub recommend_count: usize,

    /// Timeout in seconds for outgoing HTTP requests.
    #[clap(long, default_value_t = 30)]
    pub http_timeout_sec: u64,

    /// Which model service generates conversational replies.
    #[clap(long)]
    pub dialogue_backend: Option<DialogueBackend>,

    /// How the bot answers commands.
    #[clap(long)]
    pub bot_backend: Option<BotBackendKind>,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&ConfigArgs> for CliConfig {
    fn from(args: &ConfigArgs) -> Self {
        CliConfig {
            feature_table: args.feature_table.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            content_cache_age_sec: args.content_cache_age_sec,
            frontend_dir_path: args.frontend_dir_path.clone(),
            search_limit: args.search_limit,
            recommend_count: args.recommend_count,
            http_timeout_sec: args.http_timeout_sec,
            dialogue_backend: args.dialogue_backend,
            bot_backend: args.bot_backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ConfigArgs,
    }

    #[test]
    fn defaults() {
        let cli = TestCli::parse_from(["test"]);
        let config = CliConfig::from(&cli.args);
        assert_eq!(config.port, 5000);
        assert_eq!(config.search_limit, 20);
        assert_eq!(config.recommend_count, 5);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Path);
        assert!(config.feature_table.is_none());
        assert!(config.dialogue_backend.is_none());
    }

    #[test]
    fn parses_backends() {
        let cli = TestCli::parse_from([
            "test",
            "--dialogue-backend",
            "ollama",
            "--bot-backend",
            "rest",
            "--feature-table",
            "https://example.com/t.csv",
        ]);
        assert_eq!(cli.args.dialogue_backend, Some(DialogueBackend::Ollama));
        assert_eq!(cli.args.bot_backend, Some(BotBackendKind::Rest));
        assert_eq!(
            cli.args.feature_table.as_deref(),
            Some("https://example.com/t.csv")
        );
    }
}
