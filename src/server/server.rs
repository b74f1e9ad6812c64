use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};

use tower_http::services::ServeDir;
use tracing::{info, warn};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{http_cache, log_requests, metrics, state::*, ServerConfig};
use crate::context::AppContext;
use crate::error::ServiceError;
use crate::recommend::TrackSummary;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub tracks_loaded: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct TrackQuery {
    track_name: Option<String>,
}

impl TrackQuery {
    fn required_name(self) -> Result<String, ServiceError> {
        self.track_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ServiceError::Validation("track_name is required".to_string()))
    }
}

#[derive(Deserialize, Debug)]
struct ChatBody {
    #[serde(default)]
    message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ServiceError::Upstream { retryable, .. } => {
                warn!("Upstream failure: {}", self);
                json!({ "error": self.to_string(), "retryable": retryable })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        tracks_loaded: state.context.engine.table().len(),
    };
    Json(stats)
}

async fn search_track(
    State(context): State<GuardedContext>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<Vec<TrackSummary>>, ServiceError> {
    let name = query.required_name()?;
    Ok(Json(context.engine.search(&name)?))
}

async fn recommend_track(
    State(context): State<GuardedContext>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<Vec<TrackSummary>>, ServiceError> {
    let result = query
        .required_name()
        .and_then(|name| context.engine.recommend(&name, context.recommend_count));
    let outcome = match &result {
        Ok(_) => "ok",
        Err(ServiceError::NotFound(_)) => "not_found",
        Err(_) => "invalid",
    };
    metrics::record_recommendation(outcome);
    Ok(Json(result?))
}

async fn chat(
    State(context): State<GuardedContext>,
    Json(body): Json<ChatBody>,
) -> Result<impl IntoResponse, ServiceError> {
    let reply = context.pipeline.respond(&body.message).await?;
    Ok((StatusCode::OK, Json(reply)))
}

pub fn make_app(config: ServerConfig, context: Arc<AppContext>) -> Router {
    let state = ServerState::new(config.clone(), context);

    let track_routes: Router = Router::new()
        .route("/search_track", get(search_track))
        .route("/recommend_track", get(recommend_track))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    let chat_routes: Router = Router::new()
        .route("/chat", post(chat))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .merge(track_routes)
        .merge(chat_routes)
        .route("/metrics", get(metrics::metrics_handler))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

/// Serves the REST API until the context is shut down.
pub async fn run_server(context: Arc<AppContext>, config: ServerConfig) -> Result<()> {
    let port = config.port;
    let shutdown = context.shutdown_token();
    let app = make_app(config, context);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("REST server listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("REST server stopped");
    Ok(())
}
