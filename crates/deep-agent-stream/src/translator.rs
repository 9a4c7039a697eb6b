//! The stream translator.
//!
//! State machine over one request's raw event sequence. Consumes engine
//! [`RunEvent`]s in arrival order and decides which typed events to emit,
//! tagging each with the delegation depth reconstructed by the
//! [`NestingTracker`]. The output stream always terminates with exactly
//! one [`StreamEvent::Done`], whether the source ends cleanly or fails.

use std::pin::Pin;

use async_stream::stream;
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use deep_agent_core::{RunEvent, RunEventStream};

use crate::nesting::NestingTracker;
use crate::normalize::normalize;
use crate::{emit, StreamEvent};

/// Translate a raw engine event stream into the typed wire protocol.
///
/// Guarantees, for any input sequence:
/// - frames come out in causal order, never reordered;
/// - `agent_end` for a delegation always directly precedes the `tool_end`
///   carrying its result;
/// - upstream failure surfaces as a human-readable `token` frame;
/// - the final frame is always a single `done`.
pub fn translate(source: RunEventStream) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send>> {
    Box::pin(stream! {
        let mut source = source;
        let mut tracker = NestingTracker::new();
        let mut failed = false;

        yield emit::status("Starting...", 0);

        while let Some(item) = source.next().await {
            match item {
                Ok(RunEvent::ModelToken { text }) => {
                    if !text.is_empty() {
                        yield emit::token(text, tracker.depth());
                    }
                }
                Ok(RunEvent::ToolStart { run_id, name }) => {
                    debug!(run_id = %run_id, tool = %name, "invocation start");
                    let parent_depth = tracker.depth();
                    match tracker.on_start(&run_id, &name) {
                        // Delegation: tagged at the pre-push depth, opens a
                        // nesting level for everything until its end.
                        Some(true) => yield emit::agent_start(run_id, name, parent_depth),
                        Some(false) => yield emit::tool_start(run_id, name, tracker.depth()),
                        // Repeated start for an open run id; emitting again
                        // would break start/end pairing.
                        None => warn!(run_id = %run_id, "duplicate start for open run id, ignoring"),
                    }
                }
                Ok(RunEvent::ToolEnd { run_id, output }) => {
                    let Some(closed) = tracker.on_end(&run_id) else {
                        warn!(run_id = %run_id, "end event for unknown run id, ignoring");
                        continue;
                    };
                    let result = normalize(&output);
                    if closed.is_delegation {
                        // The delegation's own output is still reported as a
                        // tool result, distinct from and after its structural
                        // close.
                        yield emit::agent_end(run_id.clone(), closed.depth);
                        yield emit::tool_end(run_id, closed.name, result, closed.depth);
                    } else {
                        yield emit::tool_end(run_id, closed.name, result, closed.depth);
                    }
                }
                Ok(RunEvent::Other) => {}
                Err(e) => {
                    warn!(error = %e, "engine stream failed, finalizing");
                    yield emit::token(format!("Error: {e}"), tracker.depth());
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            yield emit::status("Complete", 0);
        }
        yield emit::done();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_of(events: Vec<anyhow::Result<RunEvent>>) -> RunEventStream {
        Box::pin(tokio_stream::iter(events))
    }

    async fn collect(events: Vec<anyhow::Result<RunEvent>>) -> Vec<StreamEvent> {
        translate(source_of(events)).collect().await
    }

    fn start(run_id: &str, name: &str) -> anyhow::Result<RunEvent> {
        Ok(RunEvent::ToolStart {
            run_id: run_id.into(),
            name: name.into(),
        })
    }

    fn end(run_id: &str, output: &str) -> anyhow::Result<RunEvent> {
        Ok(RunEvent::ToolEnd {
            run_id: run_id.into(),
            output: output.into(),
        })
    }

    fn token(text: &str) -> anyhow::Result<RunEvent> {
        Ok(RunEvent::ModelToken { text: text.into() })
    }

    #[tokio::test]
    async fn empty_run_emits_status_and_done() {
        let out = collect(vec![]).await;
        assert_eq!(
            out,
            vec![
                emit::status("Starting...", 0),
                emit::status("Complete", 0),
                emit::done(),
            ]
        );
    }

    #[tokio::test]
    async fn delegation_sequence_is_tagged_with_parent_and_child_depths() {
        // start(task) -> start(search) -> end(search) -> end(task)
        let out = collect(vec![
            start("1", "task"),
            start("2", "search"),
            end("2", "5 results"),
            end("1", "research summary"),
        ])
        .await;

        assert_eq!(
            out,
            vec![
                emit::status("Starting...", 0),
                emit::agent_start("1", "task", 0),
                emit::tool_start("2", "search", 1),
                emit::tool_end("2", "search", "5 results", 1),
                emit::agent_end("1", 0),
                emit::tool_end("1", "task", "research summary", 0),
                emit::status("Complete", 0),
                emit::done(),
            ]
        );
    }

    #[tokio::test]
    async fn tokens_are_tagged_with_enclosing_delegation_depth() {
        let out = collect(vec![
            token("top"),
            start("t", "task"),
            token("inner"),
            end("t", ""),
            token("after"),
        ])
        .await;

        assert_eq!(out[1], emit::token("top", 0));
        assert_eq!(out[3], emit::token("inner", 1));
        let after = out
            .iter()
            .find(|e| matches!(e, StreamEvent::Token { content, .. } if content == "after"))
            .unwrap();
        assert_eq!(after, &emit::token("after", 0));
    }

    #[tokio::test]
    async fn empty_tokens_are_suppressed() {
        let out = collect(vec![token(""), token("x")]).await;
        let tokens: Vec<_> = out
            .iter()
            .filter(|e| matches!(e, StreamEvent::Token { .. }))
            .collect();
        assert_eq!(tokens, vec![&emit::token("x", 0)]);
    }

    #[tokio::test]
    async fn duplicate_delegation_start_emits_one_agent_start_end_pair() {
        let out = collect(vec![
            start("t1", "task"),
            start("t1", "task"),
            token("inner"),
            end("t1", "summary"),
        ])
        .await;

        let starts = out
            .iter()
            .filter(|e| matches!(e, StreamEvent::AgentStart { .. }))
            .count();
        let ends = out
            .iter()
            .filter(|e| matches!(e, StreamEvent::AgentEnd { .. }))
            .count();
        assert_eq!(starts, 1);
        assert_eq!(ends, 1);
        assert!(out.contains(&emit::token("inner", 1)));
    }

    #[tokio::test]
    async fn tool_results_are_normalized() {
        let out = collect(vec![
            start("1", "write_file"),
            end("1", r#"{"content": "42"}"#),
        ])
        .await;
        assert_eq!(out[2], emit::tool_end("1", "write_file", "42", 0));
    }

    #[tokio::test]
    async fn end_without_start_is_ignored() {
        let out = collect(vec![end("ghost", "boo"), token("ok")]).await;
        assert!(!out
            .iter()
            .any(|e| matches!(e, StreamEvent::ToolEnd { .. })));
        assert!(out.contains(&emit::token("ok", 0)));
    }

    #[tokio::test]
    async fn unknown_engine_events_never_abort_the_stream() {
        let out = collect(vec![Ok(RunEvent::Other), token("still here")]).await;
        assert!(out.contains(&emit::token("still here", 0)));
        assert_eq!(out.last(), Some(&emit::done()));
    }

    #[tokio::test]
    async fn upstream_failure_yields_error_token_then_done() {
        let out = collect(vec![Err(anyhow::anyhow!("connection refused"))]).await;
        assert_eq!(
            out,
            vec![
                emit::status("Starting...", 0),
                emit::token("Error: connection refused", 0),
                emit::done(),
            ]
        );
    }

    #[tokio::test]
    async fn mid_stream_failure_still_terminates_with_single_done() {
        let out = collect(vec![
            token("partial"),
            start("1", "task"),
            Err(anyhow::anyhow!("timed out")),
        ])
        .await;

        let done_count = out
            .iter()
            .filter(|e| matches!(e, StreamEvent::Done))
            .count();
        assert_eq!(done_count, 1);
        assert_eq!(out.last(), Some(&emit::done()));
        // The error token is tagged at the depth in effect when it struck
        assert!(out.contains(&emit::token("Error: timed out", 1)));
    }

    #[tokio::test]
    async fn pairing_invariant_holds_for_nested_delegations() {
        let out = collect(vec![
            start("outer", "task"),
            start("inner", "task"),
            token("deep"),
            end("inner", "inner done"),
            end("outer", "outer done"),
        ])
        .await;

        // Every agent_end is immediately followed by the tool_end for the
        // same id, and inner closes before outer.
        let positions: Vec<(usize, &StreamEvent)> = out.iter().enumerate().collect();
        for (i, event) in &positions {
            if let StreamEvent::AgentEnd { agent_id, .. } = event {
                match &out[i + 1] {
                    StreamEvent::ToolEnd { tool_id, .. } => assert_eq!(tool_id, agent_id),
                    other => panic!("agent_end not followed by its tool_end: {other:?}"),
                }
            }
        }
        let inner_close = out
            .iter()
            .position(|e| matches!(e, StreamEvent::AgentEnd { agent_id, .. } if agent_id == "inner"))
            .unwrap();
        let outer_close = out
            .iter()
            .position(|e| matches!(e, StreamEvent::AgentEnd { agent_id, .. } if agent_id == "outer"))
            .unwrap();
        assert!(inner_close < outer_close);
        assert_eq!(out[inner_close], emit::agent_end("inner", 1));
        assert_eq!(out[outer_close], emit::agent_end("outer", 0));
    }
}
