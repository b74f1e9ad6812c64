//! Thin HTTP client over the REST API.

use reqwest::Response;
use serde_json::json;

pub struct TestClient {
    pub base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    pub async fn search_track(&self, track_name: &str) -> Response {
        self.client
            .get(format!("{}/search_track", self.base_url))
            .query(&[("track_name", track_name)])
            .send()
            .await
            .expect("Search request failed")
    }

    pub async fn recommend_track(&self, track_name: &str) -> Response {
        self.client
            .get(format!("{}/recommend_track", self.base_url))
            .query(&[("track_name", track_name)])
            .send()
            .await
            .expect("Recommend request failed")
    }

    /// Hits `path` with no query string at all.
    pub async fn get_without_query(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn chat(&self, message: &str) -> Response {
        self.client
            .post(format!("{}/chat", self.base_url))
            .json(&json!({ "message": message }))
            .send()
            .await
            .expect("Chat request failed")
    }

    pub async fn get_metrics(&self) -> Response {
        self.client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await
            .expect("Metrics request failed")
    }
}
