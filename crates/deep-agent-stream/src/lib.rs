//! Event stream translation layer.
//!
//! Consumes the flat, heterogeneous sequence of [`RunEvent`]s produced by
//! the execution engine and re-emits it as the typed wire protocol that
//! thin clients render incrementally: status line, token stream, tool
//! citations, and nested sub-agent indicators.
//!
//! The translator is the orchestrator; [`nesting`] reconstructs depth and
//! parent association from opaque run ids, [`normalize`] turns arbitrary
//! tool output into displayable previews, [`emit`] builds the typed event
//! records, and [`markdown`] is the legacy renderer that collapses the
//! typed stream into chat-ready markdown chunks.
//!
//! [`RunEvent`]: deep_agent_core::RunEvent

use serde::{Deserialize, Serialize};

pub mod emit;
pub mod markdown;
pub mod nesting;
pub mod normalize;
pub mod translator;

pub use markdown::render_markdown;
pub use nesting::NestingTracker;
pub use normalize::{normalize, truncate};
pub use translator::translate;

/// A typed wire-level event.
///
/// Serialized as `{"type": ..., "data": {...}}`; `done` carries no data.
/// Events are immutable once constructed and emitted at most once per
/// logical occurrence, in causal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Lifecycle milestone (start, completion).
    Status {
        description: String,
        agent_depth: usize,
    },

    /// An ordinary tool invocation has begun.
    ToolStart {
        tool_id: String,
        name: String,
        agent_depth: usize,
    },

    /// A tool invocation (or a closed delegation, reported as its own
    /// tool result) has completed.
    ToolEnd {
        tool_id: String,
        name: String,
        result: String,
        agent_depth: usize,
    },

    /// One chunk of assistant-visible text.
    Token {
        content: String,
        agent_depth: usize,
    },

    /// A sub-agent delegation has begun.
    AgentStart {
        agent_id: String,
        name: String,
        depth: usize,
    },

    /// A sub-agent delegation has completed.
    AgentEnd { agent_id: String, depth: usize },

    /// Stream terminated. Always the final event, exactly once.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_matches_protocol() {
        let event = StreamEvent::Token {
            content: "hi".into(),
            agent_depth: 1,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "token");
        assert_eq!(json["data"]["content"], "hi");
        assert_eq!(json["data"]["agent_depth"], 1);
    }

    #[test]
    fn done_has_no_data_payload() {
        let json = serde_json::to_string(&StreamEvent::Done).unwrap();
        assert_eq!(json, r#"{"type":"done"}"#);
    }

    #[test]
    fn agent_events_use_depth_field() {
        let json: serde_json::Value = serde_json::to_value(&StreamEvent::AgentEnd {
            agent_id: "r1".into(),
            depth: 0,
        })
        .unwrap();
        assert_eq!(json["data"]["depth"], 0);
        assert!(json["data"].get("agent_depth").is_none());
    }
}
