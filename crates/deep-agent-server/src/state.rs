//! Shared server state.

use std::sync::Arc;

use deep_agent_core::config::Config;
use deep_agent_core::engine::ExecutionEngine;

/// State shared by all request handlers. One engine instance serves
/// every concurrent request; per-request state lives in the streams it
/// returns.
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<dyn ExecutionEngine>,
}

impl AppState {
    pub fn new(config: Arc<Config>, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self { config, engine }
    }
}
