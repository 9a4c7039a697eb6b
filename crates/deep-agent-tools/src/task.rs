//! task tool: sub-agent delegation stub.
//!
//! Exposes the delegation schema to the LLM. The engine intercepts
//! `task` invocations and runs the selected sub-agent itself; this
//! implementation only fires if interception is wired wrong.

use async_trait::async_trait;
use serde_json::json;

use crate::{Tool, ToolContext, ToolOutput};

pub struct TaskTool;

#[async_trait]
impl Tool for TaskTool {
    fn name(&self) -> &str {
        "task"
    }

    fn description(&self) -> &str {
        "Delegate a self-contained task to a specialized sub-agent. Give the sub-agent one topic at a time and a complete description; it cannot ask follow-up questions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "description": {
                    "type": "string",
                    "description": "Full description of the task for the sub-agent"
                },
                "subagent_type": {
                    "type": "string",
                    "description": "Name of the sub-agent to delegate to (e.g. \"research-agent\")"
                }
            },
            "required": ["description", "subagent_type"]
        })
    }

    async fn execute(
        &self,
        _params: serde_json::Value,
        _context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        Ok(ToolOutput::error(
            "task delegation must be handled by the engine",
        ))
    }
}
