//! Common test infrastructure
//!
//! End-to-end tests import from this module only.
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient};
//!
//! #[tokio::test]
//! async fn test_home() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!     assert!(client.get_home().await.status().is_success());
//! }
//! ```

mod client;
mod constants;
mod fake_upstreams;
mod fixtures;
mod server;

pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use fake_upstreams::{FakeSpotify, FakeTelegram};
pub use server::TestServer;

#[allow(unused_imports)]
pub(crate) use fixtures::{write_feature_table, FixtureCatalog, ScriptedGenerator};
