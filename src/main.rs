use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spotify_chatbot::bot::{BotBackend, BotPoller, LocalBackend, RestBackend, TelegramClient};
use spotify_chatbot::cli_style::get_styles;
use spotify_chatbot::config::{self, AppConfig, BotBackendKind, ConfigArgs, Secrets};
use spotify_chatbot::context::AppContext;
use spotify_chatbot::server::{metrics, run_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(styles = get_styles())]
struct CliArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Run only the REST server, even when a bot token is configured.
    #[clap(long)]
    no_bot: bool,
}

/// Extra time a `/chat` call gets on top of the server's own dialogue timeout.
const REST_CHAT_TIMEOUT_MARGIN_SECS: u64 = 10;

fn make_bot_poller(app_config: &AppConfig, context: &Arc<AppContext>) -> Option<BotPoller> {
    if !app_config.bot_enabled() {
        info!("TELEGRAM_BOT_TOKEN not set, bot disabled");
        return None;
    }
    let token = app_config.secrets.telegram_bot_token.as_deref()?;

    let backend: Arc<dyn BotBackend> = match app_config.bot.backend {
        BotBackendKind::Local => Arc::new(LocalBackend::new(context.clone())),
        BotBackendKind::Rest => Arc::new(
            RestBackend::new(
                context.http_client.clone(),
                app_config.bot.rest_base_url.clone(),
            )
            .with_chat_timeout(Duration::from_secs(
                app_config.dialogue.timeout_sec + REST_CHAT_TIMEOUT_MARGIN_SECS,
            )),
        ),
    };
    info!("Bot enabled ({:?} backend)", app_config.bot.backend);

    let telegram = TelegramClient::new(context.http_client.clone(), &app_config.bot.api_base, token);
    Some(BotPoller::new(
        telegram,
        backend,
        Duration::from_secs(app_config.bot.poll_timeout_secs),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args.config).into();
    let secrets = Secrets::from_env()?;
    let app_config = AppConfig::resolve(&cli_config, file_config, secrets)?;

    info!("Configuration loaded:");
    info!("  feature_table: {:?}", app_config.feature_table);
    info!("  port: {}", app_config.port);
    info!("  dialogue: {:?} ({})", app_config.dialogue.backend, app_config.dialogue.model);

    info!("Initializing metrics...");
    metrics::init_metrics();

    let context = Arc::new(
        AppContext::initialize(&app_config)
            .await
            .context("Failed to initialize application context")?,
    );
    info!(
        "Loaded {} tracks into the recommendation engine",
        context.engine.table().len()
    );

    let bot_poller = if cli_args.no_bot {
        None
    } else {
        make_bot_poller(&app_config, &context)
    };
    let bot_task = bot_poller.map(|poller| {
        let shutdown = context.shutdown_token();
        tokio::spawn(async move { poller.run(shutdown).await })
    });

    info!("Ready to serve at port {}!", app_config.port);

    let server_config = ServerConfig::from(&app_config);
    let result = tokio::select! {
        result = run_server(context.clone(), server_config) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown");
            Ok(())
        }
    };

    context.shutdown();
    if let Some(task) = bot_task {
        if let Err(e) = task.await {
            warn!("Bot poller task failed: {}", e);
        }
    }

    result
}
