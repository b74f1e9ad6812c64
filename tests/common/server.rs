//! Test server lifecycle management
//!
//! Each test gets an isolated server on a random port, backed by the
//! fixture feature table and in-process catalog and dialogue stand-ins.

use super::constants::*;
use super::fixtures::{write_feature_table, FixtureCatalog, ScriptedGenerator};
use spotify_chatbot::chat::ChatPipeline;
use spotify_chatbot::intent::KeywordIntentClassifier;
use spotify_chatbot::recommend::{FeatureTable, RecommendationEngine};
use spotify_chatbot::server::{make_app, RequestsLoggingLevel, ServerConfig};
use spotify_chatbot::AppContext;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// When dropped, the server shuts down and the temp table is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    pub context: Arc<AppContext>,

    _temp_dir: TempDir,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with_cache_age(0).await
    }

    /// Spawns a server whose search and recommendation responses carry
    /// `Cache-Control: max-age=<content_cache_age_sec>`.
    pub async fn spawn_with_cache_age(content_cache_age_sec: usize) -> Self {
        let (temp_dir, table_path) =
            write_feature_table().expect("Failed to write feature table");
        let table = FeatureTable::from_path(&table_path).expect("Failed to load feature table");
        let engine = Arc::new(RecommendationEngine::new(Arc::new(table), 20));
        let pipeline = Arc::new(ChatPipeline::new(
            Arc::new(KeywordIntentClassifier::default()),
            Arc::new(FixtureCatalog),
            Arc::new(ScriptedGenerator),
        ));
        let context = Arc::new(AppContext::from_parts(
            reqwest::Client::new(),
            pipeline,
            engine,
            TEST_RECOMMEND_COUNT,
        ));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            content_cache_age_sec,
            frontend_dir_path: None,
        };
        let app = make_app(config, context.clone());

        let shutdown = context.shutdown_token();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            context,
            _temp_dir: temp_dir,
        };
        server.wait_for_ready().await;
        server
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }
            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.context.shutdown();
    }
}
