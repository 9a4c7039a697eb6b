//! Execution engine boundary.
//!
//! The engine runs the model/tool loop and reports progress as a flat,
//! ordered sequence of [`RunEvent`]s. The stream translator consumes
//! that sequence; it never sees the engine's internal structure.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// Raw lifecycle event emitted by the execution engine during a run.
///
/// Nesting is implicit: events produced inside a `task` delegation are
/// interleaved between that delegation's `ToolStart` and `ToolEnd`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// One chunk of assistant-visible text from the model.
    ModelToken { text: String },

    /// A tool (or `task` delegation) invocation has begun.
    ToolStart { run_id: String, name: String },

    /// A tool invocation completed with its raw, unnormalized output.
    ToolEnd { run_id: String, output: String },

    /// Any engine event kind the translator has no mapping for.
    /// Carried for forward compatibility; always ignored downstream.
    Other,
}

pub type RunEventStream = Pin<Box<dyn Stream<Item = anyhow::Result<RunEvent>> + Send>>;

/// The execution engine contract.
///
/// One engine instance is built at process start and shared across all
/// concurrent requests; implementations must be safe for concurrent
/// invocation. All per-request state lives in the returned stream.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Run the agent and stream raw lifecycle events.
    ///
    /// Delegations must close in LIFO order relative to their starts;
    /// the translator's nesting stack relies on this.
    fn stream(&self, messages: Vec<ChatMessage>) -> RunEventStream;

    /// Run the agent to completion and return only the final assistant text.
    async fn invoke(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String>;
}
