use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::context::AppContext;

use super::ServerConfig;

pub type GuardedContext = Arc<AppContext>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub context: GuardedContext,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, context: GuardedContext) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            context,
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

impl FromRef<ServerState> for GuardedContext {
    fn from_ref(input: &ServerState) -> Self {
        input.context.clone()
    }
}
