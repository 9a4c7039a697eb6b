//! Pure constructors for the typed wire events.

use crate::StreamEvent;

pub fn status(description: impl Into<String>, agent_depth: usize) -> StreamEvent {
    StreamEvent::Status {
        description: description.into(),
        agent_depth,
    }
}

pub fn tool_start(
    tool_id: impl Into<String>,
    name: impl Into<String>,
    agent_depth: usize,
) -> StreamEvent {
    StreamEvent::ToolStart {
        tool_id: tool_id.into(),
        name: name.into(),
        agent_depth,
    }
}

pub fn tool_end(
    tool_id: impl Into<String>,
    name: impl Into<String>,
    result: impl Into<String>,
    agent_depth: usize,
) -> StreamEvent {
    StreamEvent::ToolEnd {
        tool_id: tool_id.into(),
        name: name.into(),
        result: result.into(),
        agent_depth,
    }
}

pub fn token(content: impl Into<String>, agent_depth: usize) -> StreamEvent {
    StreamEvent::Token {
        content: content.into(),
        agent_depth,
    }
}

pub fn agent_start(
    agent_id: impl Into<String>,
    name: impl Into<String>,
    depth: usize,
) -> StreamEvent {
    StreamEvent::AgentStart {
        agent_id: agent_id.into(),
        name: name.into(),
        depth,
    }
}

pub fn agent_end(agent_id: impl Into<String>, depth: usize) -> StreamEvent {
    StreamEvent::AgentEnd {
        agent_id: agent_id.into(),
        depth,
    }
}

pub fn done() -> StreamEvent {
    StreamEvent::Done
}
