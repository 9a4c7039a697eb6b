//! Legacy chat-rendering consumer.
//!
//! Collapses the typed event stream into `{"content": ...}` JSON chunks
//! that a plain chat client appends verbatim: execution steps go into a
//! collapsible block, streamed text gets an AI/sub-agent marker, tool
//! results become one-line previews, and the final assistant segment is
//! re-emitted outside the collapsed block. Purely a renderer; all
//! nesting and normalization decisions were already made upstream.

use std::pin::Pin;

use async_stream::stream;
use futures::Stream;
use serde_json::json;
use tokio_stream::StreamExt;

use crate::normalize::{truncate, PREVIEW_LEN};
use crate::StreamEvent;

const COLLAPSE_OPEN: &str = "\n<details open>\n<summary>\u{1f50d} Execution Steps</summary>\n\n";
const COLLAPSE_CLOSE: &str = "\n</details>\n\n";
const AI_PREFIX: &str = "**\u{1f916} AI:** ";
const SUBAGENT_PREFIX: &str = "**\u{1f527} Sub-agent:** ";

fn content_chunk(text: &str) -> String {
    json!({ "content": text }).to_string()
}

fn format_tool_result(name: &str, result: &str) -> String {
    let preview = escape_html(&truncate(result, PREVIEW_LEN));
    format!("**\u{1f527} {name}:** {preview}\n\n")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a typed event stream as chat-ready markdown chunks.
///
/// With `show_tool_details` off, only the final assistant text is
/// produced. The terminal chunk is always `{"done": true}`.
pub fn render_markdown(
    events: Pin<Box<dyn Stream<Item = StreamEvent> + Send>>,
    show_tool_details: bool,
) -> Pin<Box<dyn Stream<Item = String> + Send>> {
    Box::pin(stream! {
        let mut events = events;
        let mut current_segment = String::new();
        let mut collapse_open = false;
        let mut streaming_text = false;
        // The tool_end paired with a delegation close duplicates content
        // the sub-agent already streamed; skip it.
        let mut suppressed_tool_end: Option<String> = None;

        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Token { content, agent_depth } => {
                    current_segment.push_str(&content);
                    if show_tool_details {
                        if !collapse_open {
                            yield content_chunk(COLLAPSE_OPEN);
                            collapse_open = true;
                        }
                        if !streaming_text {
                            let prefix = if agent_depth > 0 { SUBAGENT_PREFIX } else { AI_PREFIX };
                            yield content_chunk(prefix);
                            streaming_text = true;
                        }
                        yield content_chunk(&content);
                    }
                }
                StreamEvent::ToolStart { .. } | StreamEvent::AgentStart { .. } => {
                    if show_tool_details {
                        if streaming_text {
                            yield content_chunk("\n\n");
                            streaming_text = false;
                        }
                        current_segment.clear();
                        if !collapse_open {
                            yield content_chunk(COLLAPSE_OPEN);
                            collapse_open = true;
                        }
                    }
                }
                StreamEvent::AgentEnd { agent_id, .. } => {
                    suppressed_tool_end = Some(agent_id);
                }
                StreamEvent::ToolEnd { tool_id, name, result, .. } => {
                    if suppressed_tool_end.as_deref() == Some(tool_id.as_str()) {
                        suppressed_tool_end = None;
                        continue;
                    }
                    if show_tool_details {
                        if streaming_text {
                            yield content_chunk("\n\n");
                            streaming_text = false;
                        }
                        if !collapse_open {
                            yield content_chunk(COLLAPSE_OPEN);
                            collapse_open = true;
                        }
                        yield content_chunk(&format_tool_result(&name, &result));
                    }
                }
                StreamEvent::Status { .. } => {}
                StreamEvent::Done => break,
            }
        }

        if streaming_text {
            yield content_chunk("\n\n");
        }
        if collapse_open {
            yield content_chunk(COLLAPSE_CLOSE);
        }
        // Final answer is duplicated outside the collapsed block so the
        // client keeps it when the details are folded away.
        if !current_segment.trim().is_empty() {
            yield content_chunk(&current_segment);
        }
        yield json!({ "done": true }).to_string();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit;

    async fn render(events: Vec<StreamEvent>, show_tool_details: bool) -> Vec<String> {
        render_markdown(Box::pin(tokio_stream::iter(events)), show_tool_details)
            .collect()
            .await
    }

    fn content_of(chunk: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(chunk).unwrap();
        value["content"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn final_text_is_repeated_outside_the_collapse() {
        let out = render(
            vec![
                emit::status("Starting...", 0),
                emit::token("The answer is 4.", 0),
                emit::status("Complete", 0),
                emit::done(),
            ],
            true,
        )
        .await;

        let joined: String = out.iter().map(|c| content_of(c)).collect();
        assert!(joined.contains("<details open>"));
        assert!(joined.contains("</details>"));
        // Once streamed inside the block, once as the final answer
        assert_eq!(joined.matches("The answer is 4.").count(), 2);
        assert_eq!(out.last().unwrap(), r#"{"done":true}"#);
    }

    #[tokio::test]
    async fn tool_results_are_escaped_and_truncated() {
        let long = "a".repeat(300);
        let out = render(
            vec![
                emit::tool_start("1", "read_file", 0),
                emit::tool_end("1", "read_file", format!("<b>{long}</b>"), 0),
                emit::done(),
            ],
            true,
        )
        .await;

        let joined: String = out.iter().map(|c| content_of(c)).collect();
        assert!(joined.contains("**\u{1f527} read_file:** &lt;b&gt;"));
        assert!(joined.contains("..."));
        assert!(!joined.contains("<b>"));
    }

    #[tokio::test]
    async fn delegation_tool_end_is_suppressed() {
        let out = render(
            vec![
                emit::agent_start("t1", "task", 0),
                emit::token("sub findings", 1),
                emit::agent_end("t1", 0),
                emit::tool_end("t1", "task", "sub findings", 0),
                emit::done(),
            ],
            true,
        )
        .await;

        let joined: String = out.iter().map(|c| content_of(c)).collect();
        // Streamed once by the sub-agent; the paired tool result line is skipped
        assert!(!joined.contains("**\u{1f527} task:**"));
        assert!(joined.contains("**\u{1f527} Sub-agent:** "));
    }

    #[tokio::test]
    async fn sibling_tool_end_after_delegation_is_not_suppressed() {
        let out = render(
            vec![
                emit::agent_start("t1", "task", 0),
                emit::agent_end("t1", 0),
                emit::tool_end("t1", "task", "summary", 0),
                emit::tool_start("2", "ls", 0),
                emit::tool_end("2", "ls", "notes.md", 0),
                emit::done(),
            ],
            true,
        )
        .await;

        let joined: String = out.iter().map(|c| content_of(c)).collect();
        assert!(joined.contains("**\u{1f527} ls:** notes.md"));
    }

    #[tokio::test]
    async fn details_hidden_yields_only_final_answer() {
        let out = render(
            vec![
                emit::token("working", 0),
                emit::tool_start("1", "ls", 0),
                emit::tool_end("1", "ls", "files", 0),
                emit::token("final answer", 0),
                emit::done(),
            ],
            false,
        )
        .await;

        // No collapse, no prefixes, no tool lines; the whole accumulated
        // segment comes out as one chunk.
        assert_eq!(out.len(), 2);
        assert_eq!(content_of(&out[0]), "workingfinal answer");
        assert_eq!(out[1], r#"{"done":true}"#);
    }
}
