//! Spotify chatbot library
//!
//! This library exposes the components shared by the REST server, the bot
//! poller and the terminal chat.

pub mod auth;
pub mod bot;
pub mod catalog_client;
pub mod chat;
pub mod cli_style;
pub mod config;
pub mod context;
pub mod dialogue;
pub mod error;
pub mod intent;
pub mod recommend;
pub mod server;

// Re-export commonly used types for convenience
pub use context::AppContext;
pub use error::ServiceError;
pub use server::{run_server, RequestsLoggingLevel};
