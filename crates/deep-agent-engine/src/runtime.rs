//! The model/tool loop.
//!
//! Runs one agent: stream a completion, forward text deltas as events,
//! execute requested tools, append results to the transcript, repeat
//! until the model stops asking for tools. `task` invocations are
//! intercepted and run as a nested agent over the same event channel,
//! so a delegation's inner events land between its ToolStart and
//! ToolEnd.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use deep_agent_core::config::Config;
use deep_agent_core::engine::RunEvent;
use deep_agent_core::types::{ContentBlock, TranscriptEntry};
use deep_agent_tools::{ToolContext, ToolRegistry};

use crate::provider::{format_messages, CompletionRequest, ModelProvider, ToolUseChunk};

pub type EventSender = mpsc::UnboundedSender<anyhow::Result<RunEvent>>;

/// A named sub-agent the orchestrator can delegate to via the `task` tool.
#[derive(Debug, Clone)]
pub struct SubAgent {
    pub name: String,
    pub description: String,
    pub prompt: String,
    pub tools: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct TaskParams {
    #[serde(default)]
    description: String,
    #[serde(default)]
    subagent_type: String,
}

pub(crate) struct AgentRunner {
    pub provider: Arc<dyn ModelProvider>,
    pub registry: Arc<ToolRegistry>,
    pub subagents: Vec<SubAgent>,
    pub config: Arc<Config>,
}

impl AgentRunner {
    /// Run one agent to completion, returning its final assistant text.
    ///
    /// `allowed_tools` of `None` exposes the full registry. Delegation
    /// is disabled inside sub-agents, so nesting is at most one deep.
    pub async fn run(
        &self,
        context: &ToolContext,
        system: &str,
        allowed_tools: Option<&[String]>,
        allow_delegation: bool,
        mut transcript: Vec<TranscriptEntry>,
        tx: &EventSender,
    ) -> anyhow::Result<String> {
        let tools_json = self.tools_payload(allowed_tools, allow_delegation);
        let mut final_text = String::new();

        for iteration in 0..self.config.max_tool_iterations() {
            // A closed channel means every subscriber is gone (client
            // disconnect); stop making model and tool calls for it.
            if tx.is_closed() {
                debug!(iteration, "event channel closed, abandoning run");
                return Ok(final_text);
            }

            let request = CompletionRequest {
                model: self.config.model_name(),
                messages: format_messages(&transcript),
                max_tokens: self.config.max_tokens(),
                temperature: self.config.temperature(),
                tools: Some(tools_json.clone()),
                system: Some(system.to_string()),
            };

            let mut chunks = self.provider.stream(&request).await?;

            let mut text = String::new();
            let mut tool_uses: Vec<ToolUseChunk> = Vec::new();

            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                if let Some(delta) = chunk.delta {
                    text.push_str(&delta);
                    let _ = tx.send(Ok(RunEvent::ModelToken { text: delta }));
                }
                if let Some(tool_use) = chunk.tool_use {
                    tool_uses.push(tool_use);
                }
            }

            let mut assistant_blocks = Vec::new();
            if !text.is_empty() {
                assistant_blocks.push(ContentBlock::Text { text: text.clone() });
            }
            for tool_use in &tool_uses {
                assistant_blocks.push(ContentBlock::ToolUse {
                    id: tool_use.id.clone(),
                    name: tool_use.name.clone(),
                    input: parse_tool_input(&tool_use.input_json),
                });
            }
            if !assistant_blocks.is_empty() {
                transcript.push(TranscriptEntry::Assistant {
                    content: assistant_blocks,
                });
            }
            final_text = text;

            if tool_uses.is_empty() {
                return Ok(final_text);
            }

            debug!(
                iteration,
                count = tool_uses.len(),
                "executing requested tools"
            );

            for tool_use in tool_uses {
                if tx.is_closed() {
                    debug!(iteration, "event channel closed, abandoning run");
                    return Ok(final_text);
                }

                let _ = tx.send(Ok(RunEvent::ToolStart {
                    run_id: tool_use.id.clone(),
                    name: tool_use.name.clone(),
                }));

                let params = parse_tool_input(&tool_use.input_json);
                let (content, is_error) = if tool_use.name == "task" && allow_delegation {
                    let result = self.run_delegation(context, params, tx).await?;
                    (result, false)
                } else {
                    self.run_tool(context, &tool_use.name, params).await
                };

                let _ = tx.send(Ok(RunEvent::ToolEnd {
                    run_id: tool_use.id.clone(),
                    output: content.clone(),
                }));

                transcript.push(TranscriptEntry::ToolResult {
                    tool_use_id: tool_use.id,
                    tool: tool_use.name,
                    content,
                    is_error,
                });
            }
        }

        warn!(
            limit = self.config.max_tool_iterations(),
            "tool iteration limit reached, returning last assistant text"
        );
        Ok(final_text)
    }

    async fn run_tool(
        &self,
        context: &ToolContext,
        name: &str,
        params: serde_json::Value,
    ) -> (String, bool) {
        match self.registry.get(name) {
            Some(tool) => match tool.execute(params, context).await {
                Ok(output) => (output.content, output.is_error),
                Err(e) => (format!("Tool {name} failed: {e}"), true),
            },
            None => (format!("Unknown tool: {name}"), true),
        }
    }

    /// Run a `task` delegation as a nested agent, forwarding its events
    /// through the same channel.
    async fn run_delegation(
        &self,
        context: &ToolContext,
        params: serde_json::Value,
        tx: &EventSender,
    ) -> anyhow::Result<String> {
        let params: TaskParams = serde_json::from_value(params).unwrap_or(TaskParams {
            description: String::new(),
            subagent_type: String::new(),
        });

        let Some(subagent) = self
            .subagents
            .iter()
            .find(|s| s.name == params.subagent_type)
        else {
            return Ok(format!("Unknown sub-agent: {}", params.subagent_type));
        };

        debug!(subagent = %subagent.name, "running delegation");

        let sub_transcript = vec![TranscriptEntry::User {
            content: vec![ContentBlock::Text {
                text: params.description,
            }],
        }];

        Box::pin(self.run(
            context,
            &subagent.prompt,
            Some(&subagent.tools),
            false,
            sub_transcript,
            tx,
        ))
        .await
    }

    fn tools_payload(
        &self,
        allowed_tools: Option<&[String]>,
        allow_delegation: bool,
    ) -> Vec<serde_json::Value> {
        self.registry
            .tools()
            .iter()
            .filter(|tool| {
                if tool.name() == "task" && !allow_delegation {
                    return false;
                }
                match allowed_tools {
                    Some(names) => names.iter().any(|n| n == tool.name()),
                    None => true,
                }
            })
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "input_schema": tool.parameters_schema(),
                })
            })
            .collect()
    }
}

fn parse_tool_input(input_json: &str) -> serde_json::Value {
    if input_json.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(input_json).unwrap_or_else(|_| json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tool_input_parses_to_empty_object() {
        assert_eq!(parse_tool_input(""), json!({}));
        assert_eq!(parse_tool_input("   "), json!({}));
        assert_eq!(parse_tool_input("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_tool_input("not json"), json!({}));
    }
}
