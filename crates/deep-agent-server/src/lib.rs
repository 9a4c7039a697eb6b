//! Axum-based HTTP API for the deep agent.
//!
//! Endpoints:
//! - `POST /chat` runs the agent to completion and returns one message.
//! - `POST /chat/stream` streams typed `{"type", "data"}` events as SSE.
//! - `POST /chat/stream/markdown` streams the legacy markdown rendering.
//! - `GET /health` is a liveness probe.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod routes;
pub mod state;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Permissive CORS so browser-based chat frontends can call directly
    Router::new()
        .route("/chat", post(routes::chat))
        .route("/chat/stream", post(routes::chat_stream))
        .route("/chat/stream/markdown", post(routes::chat_stream_markdown))
        .route("/health", get(routes::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until interrupted.
pub async fn start_server(state: Arc<AppState>, bind: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
