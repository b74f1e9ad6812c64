use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::server::metrics;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Longest lifetime trusted from the token endpoint.
const MAX_EXPIRES_IN_SECS: i64 = 86_400;

const SERVICE: &str = "spotify-auth";

#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// `Basic base64(id:secret)` as expected by the client-credentials flow.
    pub fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw.as_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BearerToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// A token stops being used `margin` before its stated expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>, margin: ChronoDuration) -> bool {
        now + margin >= self.expires_at
    }
}

/// Lifecycle of the cached token: Absent -> Valid -> Expired -> Valid.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenState {
    Absent,
    Valid(BearerToken),
    Expired,
}

impl TokenState {
    /// Demotes a valid token whose lifetime ran out.
    fn refresh_view(&mut self, now: DateTime<Utc>, margin: ChronoDuration) {
        if let TokenState::Valid(token) = self {
            if token.is_expired_at(now, margin) {
                *self = TokenState::Expired;
            }
        }
    }

    /// Expires the cached token only if it is the one that was rejected, so a
    /// late rejection cannot discard a token fetched in the meantime.
    fn reject(&mut self, rejected: &str) -> bool {
        match self {
            TokenState::Valid(token) if token.value == rejected => {
                *self = TokenState::Expired;
                true
            }
            _ => false,
        }
    }

    fn current(&self) -> Option<&BearerToken> {
        match self {
            TokenState::Valid(token) => Some(token),
            _ => None,
        }
    }
}

/// Supplies bearer tokens for authorized catalog calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a token that is valid right now, acquiring one if needed.
    async fn bearer_token(&self) -> Result<String, ServiceError>;

    /// Marks `rejected` as expired after the API refused it. No-op when the
    /// cache already holds a different token.
    async fn invalidate(&self, rejected: &str);
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

pub struct SpotifyTokenProvider {
    client: reqwest::Client,
    token_url: String,
    credentials: ClientCredentials,
    refresh_margin: ChronoDuration,
    state: Mutex<TokenState>,
}

impl SpotifyTokenProvider {
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        credentials: ClientCredentials,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            credentials,
            refresh_margin: ChronoDuration::from_std(refresh_margin)
                .unwrap_or_else(|_| ChronoDuration::seconds(60)),
            state: Mutex::new(TokenState::Absent),
        }
    }

    pub async fn state(&self) -> TokenState {
        self.state.lock().await.clone()
    }

    /// Exchanges the client credentials for a fresh token.
    pub async fn acquire(&self) -> Result<BearerToken, ServiceError> {
        debug!("Requesting client-credentials token from {}", self.token_url);

        let response = self
            .client
            .post(&self.token_url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.credentials.basic_authorization(),
            )
            .form(&[("grant_type", "client_credentials")])
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

        let body: TokenResponse = response.json().await.map_err(|e| {
            metrics::record_upstream_call(SERVICE, "error");
            ServiceError::upstream(SERVICE, format!("Malformed token response: {}", e), false)
        })?;

        let value = body.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            metrics::record_upstream_call(SERVICE, "error");
            ServiceError::upstream(SERVICE, "Token response has no access_token", false)
        })?;

        metrics::record_upstream_call(SERVICE, "ok");
        metrics::record_token_acquired();

        Ok(BearerToken {
            value,
            expires_at: Utc::now() + token_lifetime(body.expires_in),
        })
    }
}

fn token_lifetime(expires_in: Option<i64>) -> ChronoDuration {
    let secs = expires_in
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
        .clamp(0, MAX_EXPIRES_IN_SECS);
    ChronoDuration::seconds(secs)
}

#[async_trait]
impl TokenProvider for SpotifyTokenProvider {
    async fn bearer_token(&self) -> Result<String, ServiceError> {
        // Held across the acquisition so concurrent callers share one request.
        let mut state = self.state.lock().await;
        state.refresh_view(Utc::now(), self.refresh_margin);

        if let Some(token) = state.current() {
            return Ok(token.value.clone());
        }

        if *state == TokenState::Expired {
            info!("Bearer token expired, reacquiring");
        }

        let token = self.acquire().await?;
        let value = token.value.clone();
        *state = TokenState::Valid(token);
        Ok(value)
    }

    async fn invalidate(&self, rejected: &str) {
        let mut state = self.state.lock().await;
        if state.reject(rejected) {
            warn!("Bearer token rejected, marking as expired");
        } else {
            debug!("Rejected bearer token already replaced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_authorization_header() {
        let credentials = ClientCredentials::new("my_id", "my_secret");
        // base64("my_id:my_secret")
        assert_eq!(
            credentials.basic_authorization(),
            "Basic bXlfaWQ6bXlfc2VjcmV0"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = ClientCredentials::new("my_id", "hunter2");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("my_id"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_token_expiry_honors_margin() {
        let now = Utc::now();
        let token = BearerToken {
            value: "abc".to_string(),
            expires_at: now + ChronoDuration::seconds(100),
        };
        assert!(!token.is_expired_at(now, ChronoDuration::seconds(60)));
        assert!(token.is_expired_at(now, ChronoDuration::seconds(100)));
        assert!(token.is_expired_at(now + ChronoDuration::seconds(50), ChronoDuration::seconds(60)));
    }

    #[test]
    fn test_state_transitions_valid_to_expired() {
        let now = Utc::now();
        let mut state = TokenState::Valid(BearerToken {
            value: "abc".to_string(),
            expires_at: now + ChronoDuration::seconds(30),
        });

        state.refresh_view(now, ChronoDuration::seconds(10));
        assert!(state.current().is_some());

        state.refresh_view(now + ChronoDuration::seconds(25), ChronoDuration::seconds(10));
        assert_eq!(state, TokenState::Expired);
        assert!(state.current().is_none());
    }

    #[test]
    fn test_absent_state_stays_absent() {
        let mut state = TokenState::Absent;
        state.refresh_view(Utc::now(), ChronoDuration::seconds(60));
        assert_eq!(state, TokenState::Absent);
    }

    #[test]
    fn test_reject_only_expires_matching_token() {
        let mut state = TokenState::Valid(BearerToken {
            value: "fresh".to_string(),
            expires_at: Utc::now() + ChronoDuration::seconds(3600),
        });

        assert!(!state.reject("stale"));
        assert_eq!(state.current().map(|t| t.value.as_str()), Some("fresh"));

        assert!(state.reject("fresh"));
        assert_eq!(state, TokenState::Expired);
        assert!(!state.reject("fresh"));
    }

    #[test]
    fn test_token_lifetime_is_clamped() {
        assert_eq!(token_lifetime(None), ChronoDuration::seconds(DEFAULT_EXPIRES_IN_SECS));
        assert_eq!(token_lifetime(Some(120)), ChronoDuration::seconds(120));
        assert_eq!(token_lifetime(Some(i64::MAX)), ChronoDuration::seconds(MAX_EXPIRES_IN_SECS));
        assert_eq!(token_lifetime(Some(-5)), ChronoDuration::zero());
    }
}
