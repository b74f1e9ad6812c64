//! Spotify Web API search client.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::TokenProvider;
use crate::error::ServiceError;
use crate::server::metrics;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Reply used when the catalog has nothing for the query.
pub const NOT_FOUND_MESSAGE: &str = "No se encontró la canción.";

const SERVICE: &str = "spotify";

/// First hit of a catalog search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub url: String,
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Returns the best match for `query`, or `None` when nothing matched.
    async fn search_track(&self, query: &str) -> Result<Option<CatalogTrack>, ServiceError>;
}

/// Two-line description: title and first artist, then the external URL.
pub fn format_track_info(track: &CatalogTrack) -> String {
    let artist = track
        .artists
        .first()
        .map(String::as_str)
        .unwrap_or("Unknown artist");
    format!("Track: {} by {}\nURL: {}", track.name, artist, track.url)
}

pub struct SpotifyCatalogClient {
    client: reqwest::Client,
    api_base: String,
    tokens: Arc<dyn TokenProvider>,
}

impl SpotifyCatalogClient {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_base,
            tokens,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn send_search(&self, query: &str, token: &str) -> Result<reqwest::Response, ServiceError> {
        let url = format!("{}/search", self.api_base);
        self.client
            .get(&url)
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                metrics::record_upstream_call(SERVICE, "error");
                ServiceError::from_reqwest(SERVICE, &e)
            })
    }
}

#[async_trait]
impl CatalogClient for SpotifyCatalogClient {
    async fn search_track(&self, query: &str) -> Result<Option<CatalogTrack>, ServiceError> {
        debug!(query = %query, "Searching catalog");

        let token = self.tokens.bearer_token().await?;
        let mut response = self.send_search(query, &token).await?;

        // A rejected token gets exactly one retry with a freshly acquired one.
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Catalog rejected the bearer token, retrying with a new one");
            self.tokens.invalidate(&token).await;
            let token = self.tokens.bearer_token().await?;
            response = self.send_search(query, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_call(SERVICE, "error");
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(SERVICE, status, &body));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            metrics::record_upstream_call(SERVICE, "error");
            ServiceError::upstream(SERVICE, format!("Malformed search response: {}", e), false)
        })?;
        metrics::record_upstream_call(SERVICE, "ok");

        Ok(body
            .tracks
            .items
            .into_iter()
            .next()
            .map(CatalogTrack::from))
    }
}

// Spotify API types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SpotifyTracksPage,
}

#[derive(Debug, Deserialize)]
struct SpotifyTracksPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    #[serde(default)]
    external_urls: SpotifyExternalUrls,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct SpotifyExternalUrls {
    #[serde(default)]
    spotify: String,
}

impl From<SpotifyTrack> for CatalogTrack {
    fn from(track: SpotifyTrack) -> Self {
        CatalogTrack {
            id: track.id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            url: track.external_urls.spotify,
        }
    }
}
