//! Server-sent-event line parser for provider responses.

use async_stream::stream;
use futures::Stream;
use tokio_stream::StreamExt;

/// A parsed SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Parse a byte-chunk stream as a sequence of SSE events.
///
/// Partial lines are buffered across chunks; comment lines and unknown
/// fields are skipped per the SSE spec. Any remaining data at stream end
/// is dispatched as a final event.
pub fn parse_sse_bytes<E>(
    source: impl Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
) -> impl Stream<Item = anyhow::Result<SseEvent>> + Send
where
    E: std::fmt::Display + Send + 'static,
{
    stream! {
        let mut source = std::pin::pin!(source);
        let mut buffer = String::new();
        let mut event_name: Option<String> = None;
        let mut data_lines: Vec<String> = Vec::new();

        'outer: loop {
            // Drain complete lines from the buffer
            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim_end_matches('\r').to_string();
                buffer.drain(..=newline);

                if line.is_empty() {
                    if !data_lines.is_empty() {
                        yield Ok(SseEvent {
                            event: event_name.take(),
                            data: data_lines.join("\n"),
                        });
                        data_lines.clear();
                    }
                } else if line.starts_with(':') {
                    // Comment
                } else if let Some(value) = line.strip_prefix("event:") {
                    event_name = Some(value.trim_start().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data_lines.push(value.trim_start().to_string());
                }
                // Other fields (id, retry) are irrelevant here
            }

            match source.next().await {
                Some(Ok(chunk)) => buffer.push_str(&String::from_utf8_lossy(&chunk)),
                Some(Err(e)) => {
                    yield Err(anyhow::anyhow!("SSE stream error: {e}"));
                    break 'outer;
                }
                None => {
                    if !data_lines.is_empty() {
                        yield Ok(SseEvent {
                            event: event_name.take(),
                            data: data_lines.join("\n"),
                        });
                    }
                    break 'outer;
                }
            }
        }
    }
}

/// Parse a reqwest response body as an SSE stream.
pub fn parse_sse_response(
    response: reqwest::Response,
) -> impl Stream<Item = anyhow::Result<SseEvent>> + Send {
    parse_sse_bytes(response.bytes_stream())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse_chunks(chunks: Vec<&str>) -> Vec<SseEvent> {
        let byte_chunks: Vec<Result<bytes::Bytes, std::convert::Infallible>> = chunks
            .into_iter()
            .map(|c| Ok(bytes::Bytes::from(c.to_string())))
            .collect();
        parse_sse_bytes(tokio_stream::iter(byte_chunks))
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn named_events_with_data() {
        let events =
            parse_chunks(vec!["event: message_start\ndata: {\"type\":\"x\"}\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.as_deref(), Some("message_start"));
        assert_eq!(events[0].data, "{\"type\":\"x\"}");
    }

    #[tokio::test]
    async fn lines_split_across_chunks_are_reassembled() {
        let events = parse_chunks(vec!["data: hel", "lo\n", "\n", "data: world\n\n"]).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "hello");
        assert_eq!(events[1].data, "world");
    }

    #[tokio::test]
    async fn multi_line_data_is_joined_and_comments_skipped() {
        let events = parse_chunks(vec![": keepalive\ndata: a\ndata: b\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a\nb");
    }

    #[tokio::test]
    async fn trailing_data_without_blank_line_is_flushed() {
        let events = parse_chunks(vec!["data: tail\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "tail");
    }
}
