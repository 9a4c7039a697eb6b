//! Chat and health handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::Stream;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{error, info};

use deep_agent_core::types::{ChatMessage, ChatRequest, ChatResponse};
use deep_agent_stream::{render_markdown, translate};

use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Non-streaming chat: run the agent to completion and return the final
/// assistant message.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<serde_json::Value>)> {
    info!(messages = request.messages.len(), "chat request");

    match state.engine.invoke(request.messages).await {
        Ok(content) => Ok(Json(ChatResponse {
            message: ChatMessage::assistant(content),
        })),
        Err(e) => {
            error!(%e, "chat invocation failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

/// Typed streaming chat: each SSE data line is one `{"type", "data"}`
/// event, ending with `{"type":"done"}`.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!(messages = request.messages.len(), "typed stream request");

    let events = translate(state.engine.stream(request.messages));
    let frames = events.map(|event| Event::default().json_data(&event));

    Sse::new(frames).keep_alive(KeepAlive::default())
}

/// Markdown streaming chat: the typed stream rendered into chat-ready
/// markdown chunks, one JSON object per SSE data line.
pub async fn chat_stream_markdown(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        messages = request.messages.len(),
        show_tool_details = request.show_tool_details,
        "markdown stream request"
    );

    let events = translate(state.engine.stream(request.messages));
    let chunks = render_markdown(events, request.show_tool_details);
    let frames = chunks.map(|chunk| Ok(Event::default().data(chunk)));

    Sse::new(frames).keep_alive(KeepAlive::default())
}
