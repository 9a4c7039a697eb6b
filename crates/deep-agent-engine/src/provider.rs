//! Anthropic Messages API provider.
//!
//! Streams chat completions via `POST /v1/messages` with `stream: true`,
//! folding the Anthropic SSE event grammar (content_block_start/delta/stop,
//! message_delta, message_stop) into flat [`CompletionChunk`]s.

use std::collections::HashMap;
use std::pin::Pin;

use async_stream::stream;
use async_trait::async_trait;
use futures::Stream;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use deep_agent_core::types::{ContentBlock, TranscriptEntry};

use crate::sse::parse_sse_response;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A request to the model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<serde_json::Value>,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub tools: Option<Vec<serde_json::Value>>,
    pub system: Option<String>,
}

/// A streamed chunk from the model.
#[derive(Debug, Clone, Default)]
pub struct CompletionChunk {
    pub delta: Option<String>,
    pub tool_use: Option<ToolUseChunk>,
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ToolUseChunk {
    pub id: String,
    pub name: String,
    pub input_json: String,
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = anyhow::Result<CompletionChunk>> + Send>>;

/// The model provider seam; lets the agent loop run against a scripted
/// model in tests.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<ChunkStream>;
}

pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

/// Format the transcript as Anthropic `messages` array entries.
pub fn format_messages(transcript: &[TranscriptEntry]) -> Vec<serde_json::Value> {
    let mut messages: Vec<serde_json::Value> = Vec::new();

    for entry in transcript {
        match entry {
            TranscriptEntry::User { content } => {
                let blocks: Vec<serde_json::Value> = content
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => {
                            Some(json!({ "type": "text", "text": text }))
                        }
                        _ => None,
                    })
                    .collect();
                if !blocks.is_empty() {
                    messages.push(json!({ "role": "user", "content": blocks }));
                }
            }
            TranscriptEntry::Assistant { content } => {
                let mut blocks = Vec::new();
                for block in content {
                    match block {
                        ContentBlock::Text { text } => {
                            blocks.push(json!({ "type": "text", "text": text }));
                        }
                        ContentBlock::ToolUse { id, name, input } => {
                            blocks.push(json!({
                                "type": "tool_use",
                                "id": id,
                                "name": name,
                                "input": input,
                            }));
                        }
                        ContentBlock::ToolResult { .. } => {}
                    }
                }
                if !blocks.is_empty() {
                    messages.push(json!({ "role": "assistant", "content": blocks }));
                }
            }
            TranscriptEntry::ToolResult {
                tool_use_id,
                content,
                is_error,
                ..
            } => {
                messages.push(json!({
                    "role": "user",
                    "content": [{
                        "type": "tool_result",
                        "tool_use_id": tool_use_id,
                        "content": content,
                        "is_error": is_error,
                    }],
                }));
            }
        }
    }

    messages
}

// --- Anthropic stream event shapes (the subset we consume) ---

#[derive(Debug, serde::Deserialize)]
struct StreamPayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    content_block: Option<RawContentBlock>,
    #[serde(default)]
    delta: Option<RawDelta>,
    #[serde(default)]
    error: Option<RawError>,
}

#[derive(Debug, serde::Deserialize)]
struct RawContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct RawDelta {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    partial_json: Option<String>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct RawError {
    #[serde(default)]
    message: String,
}

#[derive(Debug)]
struct ToolAccumulator {
    id: String,
    name: String,
    input_json: String,
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    async fn stream(&self, request: &CompletionRequest) -> anyhow::Result<ChunkStream> {
        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": request.messages,
            "stream": true,
        });
        if let Some(ref system) = request.system {
            body["system"] = json!(system);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(ref tools) = request.tools {
            body["tools"] = json!(tools);
        }

        debug!(model = %request.model, "streaming Anthropic Messages API");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error {status}: {body}");
        }

        let sse = parse_sse_response(response);

        let chunks = stream! {
            let mut sse = std::pin::pin!(sse);
            let mut tool_blocks: HashMap<usize, ToolAccumulator> = HashMap::new();

            while let Some(item) = sse.next().await {
                let event = match item {
                    Ok(e) => e,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                let payload: StreamPayload = match serde_json::from_str(&event.data) {
                    Ok(p) => p,
                    Err(e) => {
                        trace!(%e, data = %event.data, "unparsable stream payload, skipping");
                        continue;
                    }
                };

                match payload.kind.as_str() {
                    "content_block_start" => {
                        if let (Some(index), Some(block)) = (payload.index, payload.content_block) {
                            if block.kind == "tool_use" {
                                tool_blocks.insert(index, ToolAccumulator {
                                    id: block.id.unwrap_or_default(),
                                    name: block.name.unwrap_or_default(),
                                    input_json: String::new(),
                                });
                            }
                        }
                    }
                    "content_block_delta" => {
                        let Some(delta) = payload.delta else { continue };
                        match delta.kind.as_deref() {
                            Some("text_delta") => {
                                if let Some(text) = delta.text {
                                    if !text.is_empty() {
                                        yield Ok(CompletionChunk {
                                            delta: Some(text),
                                            ..Default::default()
                                        });
                                    }
                                }
                            }
                            Some("input_json_delta") => {
                                if let (Some(index), Some(partial)) =
                                    (payload.index, delta.partial_json)
                                {
                                    if let Some(acc) = tool_blocks.get_mut(&index) {
                                        acc.input_json.push_str(&partial);
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                    "content_block_stop" => {
                        if let Some(acc) = payload.index.and_then(|i| tool_blocks.remove(&i)) {
                            yield Ok(CompletionChunk {
                                tool_use: Some(ToolUseChunk {
                                    id: acc.id,
                                    name: acc.name,
                                    input_json: acc.input_json,
                                }),
                                ..Default::default()
                            });
                        }
                    }
                    "message_delta" => {
                        if let Some(reason) = payload.delta.and_then(|d| d.stop_reason) {
                            yield Ok(CompletionChunk {
                                stop_reason: Some(reason),
                                ..Default::default()
                            });
                        }
                    }
                    "message_stop" => return,
                    "error" => {
                        let message = payload
                            .error
                            .map(|e| e.message)
                            .unwrap_or_else(|| "unknown stream error".into());
                        yield Err(anyhow::anyhow!("Anthropic stream error: {message}"));
                        return;
                    }
                    // message_start, ping, and future event kinds
                    _ => {}
                }
            }
        };

        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_entry(text: &str) -> TranscriptEntry {
        TranscriptEntry::User {
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
        }
    }

    #[test]
    fn tool_results_become_user_tool_result_blocks() {
        let transcript = vec![
            user_entry("hi"),
            TranscriptEntry::Assistant {
                content: vec![ContentBlock::ToolUse {
                    id: "toolu_1".into(),
                    name: "ls".into(),
                    input: json!({}),
                }],
            },
            TranscriptEntry::ToolResult {
                tool_use_id: "toolu_1".into(),
                tool: "ls".into(),
                content: "No files in workspace.".into(),
                is_error: false,
            },
        ];

        let messages = format_messages(&transcript);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["content"][0]["type"], "tool_use");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"][0]["type"], "tool_result");
        assert_eq!(messages[2]["content"][0]["tool_use_id"], "toolu_1");
    }

    #[test]
    fn user_text_becomes_text_blocks() {
        let messages = format_messages(&[user_entry("q")]);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"][0]["text"], "q");
    }
}
