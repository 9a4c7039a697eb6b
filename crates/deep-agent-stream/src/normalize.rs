//! Tool output normalization.
//!
//! Tool outputs arrive in whatever shape the tool happened to produce:
//! plain text, JSON blobs, or the debug rendering of a state-update
//! command envelope. [`normalize`] turns any of them into a displayable
//! string without ever failing; [`truncate`] bounds it for inline
//! previews while callers keep the full value for citations.

/// Preview used when there is nothing informative to show.
pub const COMPLETED: &str = "\u{2713} completed";

/// Default inline preview length.
pub const PREVIEW_LEN: usize = 200;

const COMMAND_MARKER: &str = "Command(";
const MESSAGE_MARKER: &str = "ToolMessage(content=";

/// Produce a human-readable preview of a raw tool output.
///
/// Decision order, first match wins:
/// 1. empty or whitespace-only input: [`COMPLETED`]
/// 2. command-envelope text: the first single-quoted message payload,
///    or [`COMPLETED`] when extraction fails
/// 3. JSON object: the string form of the first of `content`,
///    `message`, `result` present; [`COMPLETED`] for objects without
///    those keys and for non-object JSON
/// 4. anything else: the raw text verbatim
///
/// Total and pure: never panics, never errors.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return COMPLETED.to_string();
    }

    if raw.starts_with(COMMAND_MARKER) {
        return extract_command_message(raw).unwrap_or_else(|| COMPLETED.to_string());
    }

    if raw.starts_with('{') || raw.starts_with('[') {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => {
                for key in ["content", "message", "result"] {
                    if let Some(value) = map.get(key) {
                        return value_to_text(value);
                    }
                }
                return COMPLETED.to_string();
            }
            Ok(_) => return COMPLETED.to_string(),
            // Unparsable JSON-looking text falls through to raw passthrough,
            // which keeps already-normalized previews stable under re-normalization.
            Err(_) => {}
        }
    }

    raw.to_string()
}

/// Hard-truncate `text` to `max_len` characters with an ellipsis suffix.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        let cut: String = text.chars().take(max_len).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Pull the first single-quoted payload after the message sub-marker out
/// of a command-envelope debug string.
fn extract_command_message(raw: &str) -> Option<String> {
    let marker = raw.find(MESSAGE_MARKER)?;
    let after = &raw[marker + MESSAGE_MARKER.len()..];
    let start = after.find('\'')? + 1;
    let end = after[start..].find('\'')? + start;
    if end > start {
        Some(after[start..end].to_string())
    } else {
        None
    }
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
