//! Process-wide application context.
//!
//! Built once at startup by [`AppContext::initialize`], then shared read-only
//! through an `Arc` by the REST server, the bot poller and the terminal chat.
//! Initialization order:
//!
//! 1. HTTP client
//! 2. token provider, with the first token acquired up front
//! 3. catalog client
//! 4. intent classifier
//! 5. dialogue generator
//! 6. feature table, from a file or a URL
//! 7. recommendation engine
//! 8. chat pipeline
//!
//! [`AppContext::shutdown`] is the only teardown point.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::auth::{ClientCredentials, SpotifyTokenProvider, TokenProvider};
use crate::catalog_client::SpotifyCatalogClient;
use crate::chat::ChatPipeline;
use crate::config::{AppConfig, DialogueBackend, FeatureTableSource};
use crate::dialogue::{
    DialogueGenerator, HuggingFaceGenerator, LlmDialogueGenerator, LlmProvider, OllamaProvider,
};
use crate::error::ServiceError;
use crate::intent::KeywordIntentClassifier;
use crate::recommend::{fetch_feature_table, FeatureTable, RecommendationEngine};
use crate::server::metrics;

pub struct AppContext {
    pub http_client: reqwest::Client,
    pub pipeline: Arc<ChatPipeline>,
    pub engine: Arc<RecommendationEngine>,
    pub recommend_count: usize,
    shutdown: CancellationToken,
}

impl AppContext {
    pub async fn initialize(config: &AppConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_sec))
            .build()
            .map_err(|e| {
                ServiceError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        let credentials = ClientCredentials::new(
            config.secrets.spotify_client_id.clone(),
            config.secrets.spotify_client_secret.clone(),
        );
        let token_provider = SpotifyTokenProvider::new(
            http_client.clone(),
            config.spotify.token_url.clone(),
            credentials,
            Duration::from_secs(config.spotify.refresh_margin_secs),
        );
        token_provider.bearer_token().await?;
        info!("Acquired initial catalog access token");
        let tokens: Arc<dyn TokenProvider> = Arc::new(token_provider);

        let catalog = Arc::new(SpotifyCatalogClient::new(
            http_client.clone(),
            config.spotify.api_base.clone(),
            tokens,
        ));

        let classifier = Arc::new(KeywordIntentClassifier::default());

        let generator: Arc<dyn DialogueGenerator> = match config.dialogue.backend {
            DialogueBackend::HuggingFace => Arc::new(
                HuggingFaceGenerator::new(
                    http_client.clone(),
                    config.dialogue.base_url.clone(),
                    config.dialogue.model.clone(),
                    config.secrets.hf_token.clone(),
                    config.dialogue.max_length,
                )
                .with_timeout(Duration::from_secs(config.dialogue.timeout_sec)),
            ),
            DialogueBackend::Ollama => {
                let provider = OllamaProvider::new(
                    http_client.clone(),
                    config.dialogue.base_url.clone(),
                    config.dialogue.model.clone(),
                );
                // The server may come up after us, so this only warns.
                if let Err(e) = provider.health_check().await {
                    warn!("Ollama at {} is not ready: {}", config.dialogue.base_url, e);
                }
                Arc::new(
                    LlmDialogueGenerator::new(Arc::new(provider), config.dialogue.max_length)
                        .with_timeout(Duration::from_secs(config.dialogue.timeout_sec)),
                )
            }
        };
        info!(
            "Dialogue generator ready ({:?}, model {})",
            config.dialogue.backend, config.dialogue.model
        );

        let table = match &config.feature_table {
            FeatureTableSource::Path(path) => FeatureTable::from_path(path)?,
            FeatureTableSource::Url(url) => fetch_feature_table(&http_client, url).await?,
        };
        metrics::set_feature_table_tracks(table.len());
        let engine = Arc::new(RecommendationEngine::new(
            Arc::new(table),
            config.search_limit,
        ));

        let pipeline = Arc::new(ChatPipeline::new(classifier, catalog, generator));

        Ok(Self::from_parts(
            http_client,
            pipeline,
            engine,
            config.recommend_count,
        ))
    }

    /// Assembles a context from already-built components.
    pub fn from_parts(
        http_client: reqwest::Client,
        pipeline: Arc<ChatPipeline>,
        engine: Arc<RecommendationEngine>,
        recommend_count: usize,
    ) -> Self {
        Self {
            http_client,
            pipeline,
            engine,
            recommend_count,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token cancelled by [`AppContext::shutdown`]. Long-running tasks stop
    /// when it fires.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Shutting down application context");
            self.shutdown.cancel();
        }
    }
}
