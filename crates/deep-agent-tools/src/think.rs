//! think_tool: a reflection scratchpad with no side effects.
//!
//! Gives the model a place to reason about search results and plan the
//! next step; the reflection is echoed back so it lands in the transcript.

use async_trait::async_trait;
use serde_json::json;

use crate::{Tool, ToolContext, ToolOutput};

pub struct ThinkTool;

#[async_trait]
impl Tool for ThinkTool {
    fn name(&self) -> &str {
        "think_tool"
    }

    fn description(&self) -> &str {
        "Record a strategic reflection: what was learned, what is missing, and whether to continue or answer. Use after each search."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "reflection": {
                    "type": "string",
                    "description": "The reflection to record"
                }
            },
            "required": ["reflection"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let reflection = params
            .get("reflection")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        Ok(ToolOutput::text(format!(
            "Reflection recorded: {reflection}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_context;

    #[tokio::test]
    async fn echoes_the_reflection() {
        let out = ThinkTool
            .execute(
                json!({"reflection": "enough sources, answer now"}),
                &test_context(),
            )
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(out.content, "Reflection recorded: enough sources, answer now");
    }
}
