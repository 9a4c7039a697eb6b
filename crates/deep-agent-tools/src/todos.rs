//! Todo list tools: the agent's per-request planning scratchpad.

use async_trait::async_trait;
use serde_json::json;

use deep_agent_core::types::{TodoItem, TodoStatus};

use crate::{Tool, ToolContext, ToolOutput};

fn status_label(status: TodoStatus) -> &'static str {
    match status {
        TodoStatus::Pending => "pending",
        TodoStatus::InProgress => "in_progress",
        TodoStatus::Completed => "completed",
    }
}

pub struct ReadTodosTool;

#[async_trait]
impl Tool for ReadTodosTool {
    fn name(&self) -> &str {
        "read_todos"
    }

    fn description(&self) -> &str {
        "Read the current todo list with each item's status."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(
        &self,
        _params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let todos = context.todos.lock().await;
        if todos.is_empty() {
            return Ok(ToolOutput::text("No todos."));
        }
        let listing = todos
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. [{}] {}", i + 1, status_label(t.status), t.content))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ToolOutput::text(listing))
    }
}

pub struct WriteTodosTool;

#[async_trait]
impl Tool for WriteTodosTool {
    fn name(&self) -> &str {
        "write_todos"
    }

    fn description(&self) -> &str {
        "Replace the todo list. Use to plan multi-step work and mark progress; keep exactly one item in_progress at a time."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "todos": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "content": { "type": "string" },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "in_progress", "completed"]
                            }
                        },
                        "required": ["content"]
                    },
                    "description": "The full todo list; replaces the previous one"
                }
            },
            "required": ["todos"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let items: Vec<TodoItem> = match params.get("todos") {
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(items) => items,
                Err(e) => return Ok(ToolOutput::error(format!("Invalid todos: {e}"))),
            },
            None => return Ok(ToolOutput::error("missing 'todos' parameter")),
        };

        let count = items.len();
        let mut todos = context.todos.lock().await;
        *todos = items;
        Ok(ToolOutput::text(format!("Updated todo list ({count} items)")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_context;

    #[tokio::test]
    async fn write_replaces_and_read_reports_statuses() {
        let ctx = test_context();
        let out = WriteTodosTool
            .execute(
                json!({"todos": [
                    {"content": "research topic", "status": "in_progress"},
                    {"content": "write summary"}
                ]}),
                &ctx,
            )
            .await
            .unwrap();
        assert!(out.content.contains("2 items"));

        let read = ReadTodosTool.execute(json!({}), &ctx).await.unwrap();
        assert!(read.content.contains("[in_progress] research topic"));
        assert!(read.content.contains("[pending] write summary"));
    }

    #[tokio::test]
    async fn malformed_todos_are_a_tool_error_not_a_panic() {
        let ctx = test_context();
        let out = WriteTodosTool
            .execute(json!({"todos": "not a list"}), &ctx)
            .await
            .unwrap();
        assert!(out.is_error);
    }

    #[tokio::test]
    async fn empty_list_reads_as_no_todos() {
        let ctx = test_context();
        let read = ReadTodosTool.execute(json!({}), &ctx).await.unwrap();
        assert_eq!(read.content, "No todos.");
    }
}
