//! Virtual file-system tools.
//!
//! The agent's files live in an in-memory map scoped to one request;
//! nothing touches the real disk. Sub-agents see the same map as the
//! main agent, so delegated work can hand results back through files.

use async_trait::async_trait;
use serde_json::json;

use crate::{Tool, ToolContext, ToolOutput};

pub struct LsTool;

#[async_trait]
impl Tool for LsTool {
    fn name(&self) -> &str {
        "ls"
    }

    fn description(&self) -> &str {
        "List all files in the agent's workspace."
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
        let files = context.files.lock().await;
        if files.is_empty() {
            return Ok(ToolOutput::text("No files in workspace."));
        }
        let mut names: Vec<&String> = files.keys().collect();
        names.sort();
        let listing = names
            .iter()
            .map(|n| format!("- {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ToolOutput::text(listing))
    }
}

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a file from the workspace, optionally with line offset and limit. Returns content with line numbers."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to read"
                },
                "offset": {
                    "type": "integer",
                    "description": "Line number to start from (0-indexed)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of lines to return (default: 2000)"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let path = match params.get("file_path").and_then(|v| v.as_str()) {
            Some(p) => p,
            None => return Ok(ToolOutput::error("missing 'file_path' parameter")),
        };
        let offset = params.get("offset").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let limit = params
            .get("limit")
            .and_then(|v| v.as_u64())
            .unwrap_or(2000) as usize;

        let files = context.files.lock().await;
        let Some(content) = files.get(path) else {
            return Ok(ToolOutput::error(format!("File not found: {path}")));
        };

        if content.is_empty() {
            return Ok(ToolOutput::text("(empty file)"));
        }

        let numbered = content
            .lines()
            .enumerate()
            .skip(offset)
            .take(limit)
            .map(|(i, line)| format!("{:>6}\t{line}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");

        if numbered.is_empty() {
            return Ok(ToolOutput::error(format!(
                "Offset {offset} is past the end of {path}"
            )));
        }

        Ok(ToolOutput::text(numbered))
    }
}

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file in the workspace, replacing it if it already exists."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "Full content of the file"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let path = match params.get("file_path").and_then(|v| v.as_str()) {
            Some(p) => p,
            None => return Ok(ToolOutput::error("missing 'file_path' parameter")),
        };
        let content = params
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let mut files = context.files.lock().await;
        files.insert(path.to_string(), content.to_string());
        Ok(ToolOutput::text(format!("Updated file {path}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_context;

    #[tokio::test]
    async fn write_then_read_round_trips_with_line_numbers() {
        let ctx = test_context();
        let write = WriteFileTool
            .execute(
                json!({"file_path": "notes.md", "content": "alpha\nbeta"}),
                &ctx,
            )
            .await
            .unwrap();
        assert!(!write.is_error);

        let read = ReadFileTool
            .execute(json!({"file_path": "notes.md"}), &ctx)
            .await
            .unwrap();
        assert!(read.content.contains("1\talpha"));
        assert!(read.content.contains("2\tbeta"));
    }

    #[tokio::test]
    async fn ls_lists_sorted_files() {
        let ctx = test_context();
        for name in ["b.txt", "a.txt"] {
            WriteFileTool
                .execute(json!({"file_path": name, "content": ""}), &ctx)
                .await
                .unwrap();
        }
        let out = LsTool.execute(json!({}), &ctx).await.unwrap();
        let a = out.content.find("a.txt").unwrap();
        let b = out.content.find("b.txt").unwrap();
        assert!(a < b);
    }

    #[tokio::test]
    async fn reading_missing_file_is_a_tool_error() {
        let ctx = test_context();
        let out = ReadFileTool
            .execute(json!({"file_path": "ghost.txt"}), &ctx)
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.content.contains("File not found"));
    }

    #[tokio::test]
    async fn offset_and_limit_select_a_window() {
        let ctx = test_context();
        let body = (1..=10).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        WriteFileTool
            .execute(json!({"file_path": "big.txt", "content": body}), &ctx)
            .await
            .unwrap();

        let out = ReadFileTool
            .execute(json!({"file_path": "big.txt", "offset": 2, "limit": 2}), &ctx)
            .await
            .unwrap();
        assert!(out.content.contains("line3"));
        assert!(out.content.contains("line4"));
        assert!(!out.content.contains("line5"));
    }
}
