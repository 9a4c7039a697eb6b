//! Built-in tool implementations for the agent runtime.
//!
//! Tools are capabilities exposed to the LLM during agent runs. Each
//! tool implements the [`Tool`] trait and operates on the per-request
//! [`ToolContext`]: a virtual file map and a todo list that live only
//! for the duration of one conversation turn.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use deep_agent_core::config::Config;
use deep_agent_core::types::TodoItem;

pub mod fs;
pub mod search;
pub mod task;
pub mod think;
pub mod todos;

pub use fs::{LsTool, ReadFileTool, WriteFileTool};
pub use search::TavilySearchTool;
pub use task::TaskTool;
pub use think::ThinkTool;
pub use todos::{ReadTodosTool, WriteTodosTool};

/// Per-request state shared by all tools of one run, including tools
/// running inside sub-agent delegations.
#[derive(Clone)]
pub struct ToolContext {
    pub files: Arc<Mutex<HashMap<String, String>>>,
    pub todos: Arc<Mutex<Vec<TodoItem>>>,
    pub config: Arc<Config>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            todos: Arc::new(Mutex::new(Vec::new())),
            config,
        }
    }
}

/// Output from a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// The core tool trait. Every built-in tool implements this.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as exposed to the LLM (e.g., "ls", "read_file").
    fn name(&self) -> &str;

    /// Human-readable description for the LLM.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters.
    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput>;
}

/// Registry of available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }
}

/// Register every built-in tool, including the `task` delegation stub.
pub fn register_builtin_tools(registry: &mut ToolRegistry) {
    registry.register(Box::new(LsTool));
    registry.register(Box::new(ReadFileTool));
    registry.register(Box::new(WriteFileTool));
    registry.register(Box::new(ReadTodosTool));
    registry.register(Box::new(WriteTodosTool));
    registry.register(Box::new(TavilySearchTool));
    registry.register(Box::new(ThinkTool));
    registry.register(Box::new(TaskTool));
}

#[cfg(test)]
pub(crate) fn test_context() -> ToolContext {
    ToolContext::new(Arc::new(Config::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_contains_the_full_toolset() {
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry);
        let names = registry.list();
        for expected in [
            "ls",
            "read_file",
            "write_file",
            "read_todos",
            "write_todos",
            "tavily_search",
            "think_tool",
            "task",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }

    #[test]
    fn lookup_by_name() {
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry);
        assert!(registry.get("write_todos").is_some());
        assert!(registry.get("nonexistent").is_none());
    }
}
