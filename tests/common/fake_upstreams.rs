//! Local stand-ins for the third-party HTTP services.
//!
//! Both fakes listen on a random port and stop when dropped.

use super::constants::*;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

async fn serve(app: Router) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Fake upstream failed");
    });
    (format!("http://127.0.0.1:{}", port), shutdown_tx)
}

// ============================================================================
// Spotify accounts + Web API
// ============================================================================

#[derive(Default)]
pub struct SpotifyCalls {
    pub token_requests: AtomicUsize,
    pub search_requests: AtomicUsize,
    /// Bearer tokens seen by the search endpoint, in order.
    pub bearers: Mutex<Vec<String>>,
    /// Query strings seen by the search endpoint, in order.
    pub queries: Mutex<Vec<HashMap<String, String>>>,
}

struct SpotifyState {
    expires_in: i64,
    reject_next_search: AtomicBool,
    calls: Arc<SpotifyCalls>,
}

pub struct FakeSpotify {
    pub base_url: String,
    pub calls: Arc<SpotifyCalls>,
    state: Arc<SpotifyState>,
    _shutdown_tx: oneshot::Sender<()>,
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
}

fn expected_basic_header() -> String {
    let raw = format!("{}:{}", SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET);
    format!("Basic {}", STANDARD.encode(raw))
}

async fn issue_token(
    State(state): State<Arc<SpotifyState>>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Response {
    let n = state.calls.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected_basic_header());
    if !authorized || form.grant_type != "client_credentials" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_client"})),
        )
            .into_response();
    }
    Json(json!({
        "access_token": format!("token-{}", n),
        "token_type": "Bearer",
        "expires_in": state.expires_in,
    }))
    .into_response()
}

async fn search(
    State(state): State<Arc<SpotifyState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.calls.search_requests.fetch_add(1, Ordering::SeqCst);
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();
    state.calls.bearers.lock().unwrap().push(bearer);
    state.calls.queries.lock().unwrap().push(query.clone());

    if state.reject_next_search.swap(false, Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"status": 401, "message": "The access token expired"}})),
        )
            .into_response();
    }

    let q = query.get("q").cloned().unwrap_or_default();
    if q == "server error" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    let items: Vec<Value> = if q.contains("nothing") {
        vec![]
    } else {
        vec![json!({
            "id": "3AJwUDP919kvQ9QcozQPxg",
            "name": q,
            "artists": [{"name": "Coldplay"}, {"name": "Guest"}],
            "external_urls": {"spotify": "https://open.spotify.com/track/3AJwUDP919kvQ9QcozQPxg"}
        })]
    };
    Json(json!({"tracks": {"items": items}})).into_response()
}

impl FakeSpotify {
    /// Issues tokens living `expires_in` seconds.
    pub async fn spawn(expires_in: i64) -> Self {
        let calls = Arc::new(SpotifyCalls::default());
        let state = Arc::new(SpotifyState {
            expires_in,
            reject_next_search: AtomicBool::new(false),
            calls: calls.clone(),
        });
        let app = Router::new()
            .route("/api/token", post(issue_token))
            .route("/v1/search", get(search))
            .with_state(state.clone());
        let (base_url, shutdown_tx) = serve(app).await;
        Self {
            base_url,
            calls,
            state,
            _shutdown_tx: shutdown_tx,
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.base_url)
    }

    pub fn api_base(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    /// The next search answers 401 regardless of the token.
    pub fn reject_next_search(&self) {
        self.state.reject_next_search.store(true, Ordering::SeqCst);
    }

    pub fn token_requests(&self) -> usize {
        self.calls.token_requests.load(Ordering::SeqCst)
    }

    pub fn search_requests(&self) -> usize {
        self.calls.search_requests.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Telegram Bot API
// ============================================================================

struct TelegramState {
    pending: Mutex<VecDeque<Value>>,
    offsets: Mutex<Vec<i64>>,
    sent: Mutex<Vec<(i64, String)>>,
}

pub struct FakeTelegram {
    pub base_url: String,
    state: Arc<TelegramState>,
    _shutdown_tx: oneshot::Sender<()>,
}

async fn get_updates(
    State(state): State<Arc<TelegramState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let offset = query
        .get("offset")
        .and_then(|o| o.parse::<i64>().ok())
        .unwrap_or(0);
    state.offsets.lock().unwrap().push(offset);

    let updates: Vec<Value> = {
        let mut pending = state.pending.lock().unwrap();
        pending.retain(|u| u["update_id"].as_i64().unwrap_or(0) >= offset);
        pending.iter().cloned().collect()
    };
    if updates.is_empty() {
        // Stands in for the long poll holding the connection open.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    Json(json!({"ok": true, "result": updates}))
}

#[derive(Deserialize)]
struct SendMessageBody {
    chat_id: i64,
    text: String,
}

async fn send_message(
    State(state): State<Arc<TelegramState>>,
    Json(body): Json<SendMessageBody>,
) -> Json<Value> {
    state.sent.lock().unwrap().push((body.chat_id, body.text));
    Json(json!({"ok": true, "result": {"message_id": 1}}))
}

impl FakeTelegram {
    pub async fn spawn() -> Self {
        let state = Arc::new(TelegramState {
            pending: Mutex::new(VecDeque::new()),
            offsets: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        });
        let prefix = format!("/bot{}", TELEGRAM_TOKEN);
        let app = Router::new()
            .route(&format!("{}/getUpdates", prefix), get(get_updates))
            .route(&format!("{}/sendMessage", prefix), post(send_message))
            .with_state(state.clone());
        let (base_url, shutdown_tx) = serve(app).await;
        Self {
            base_url,
            state,
            _shutdown_tx: shutdown_tx,
        }
    }

    /// Queues a text message from `chat_id`; it is delivered until the
    /// poller acknowledges it with a higher offset.
    pub fn push_message(&self, update_id: i64, chat_id: i64, text: &str) {
        self.state.pending.lock().unwrap().push_back(json!({
            "update_id": update_id,
            "message": {
                "message_id": update_id,
                "chat": {"id": chat_id, "type": "private"},
                "text": text
            }
        }));
    }

    pub fn sent_messages(&self) -> Vec<(i64, String)> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn offsets(&self) -> Vec<i64> {
        self.state.offsets.lock().unwrap().clone()
    }
}
