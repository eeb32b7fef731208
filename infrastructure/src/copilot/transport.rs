//! Transport layer for Copilot CLI communication.
//!
//! Frames are JSON-RPC bodies preceded by a `Content-Length` header block,
//! LSP style:
//!
//! ```text
//! Content-Length: 42\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"method":"ping"}
//! ```
//!
//! This module holds the framing helpers and the pure message classification
//! used by the [`MessageRouter`](super::router::MessageRouter)'s background
//! reader task.

use crate::copilot::error::{CopilotError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Line printed by `copilot --server` once it accepts connections.
const PORT_ANNOUNCEMENT: &str = "CLI server listening on port ";

/// Classification of an incoming JSON-RPC message.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A response to a request we sent (has `id`, no `method`).
    Response,
    /// An incoming request from the CLI (has `id` + `method`), e.g. `tool.call`.
    IncomingRequest { id: u64 },
    /// A notification (has `method`, no `id`), e.g. `session.event`.
    Notification,
}

/// Classify a JSON-RPC message by inspecting `id` and `method` fields.
pub fn classify_message(json: &serde_json::Value) -> MessageKind {
    let has_id = json.get("id").and_then(|v| v.as_u64());
    let has_method = json.get("method").and_then(|v| v.as_str());

    match (has_id, has_method) {
        (Some(id), Some(_)) => MessageKind::IncomingRequest { id },
        (Some(_), None) => MessageKind::Response,
        _ => MessageKind::Notification,
    }
}

/// Extract the port from a `CLI server listening on port N` line.
///
/// Returns `None` for unrelated output, `Some(Err)` when the line is the
/// announcement but the port does not parse.
pub fn parse_port_announcement(line: &str) -> Option<Result<u16>> {
    let port_str = line.trim().strip_prefix(PORT_ANNOUNCEMENT)?;
    Some(port_str.trim().parse::<u16>().map_err(|_| {
        CopilotError::UnexpectedResponse(format!("Failed to parse port number: {}", port_str))
    }))
}

/// Write one framed message and flush.
pub async fn write_frame<W>(writer: &mut W, body: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message body.
///
/// Returns `Ok(None)` on a clean end of stream between frames.
pub async fn read_frame<R>(reader: &mut R, line: &mut String) -> Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let content_length = match read_content_length(reader, line).await? {
        Some(len) => len,
        None => return Ok(None),
    };

    // Skip remaining headers up to the blank separator line
    loop {
        line.clear();
        if reader.read_line(line).await? == 0 {
            return Err(CopilotError::RouterStopped);
        }
        if line.trim().is_empty() {
            break;
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Read lines until a `Content-Length` header is found.
async fn read_content_length<R>(reader: &mut R, line: &mut String) -> Result<Option<usize>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        line.clear();
        if reader.read_line(line).await? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(len_str) = trimmed.strip_prefix("Content-Length:") {
            return len_str.trim().parse::<usize>().map(Some).map_err(|_| {
                CopilotError::ParseError {
                    error: "invalid Content-Length".to_string(),
                    raw: trimmed.to_string(),
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn classify_response() {
        let json = serde_json::json!({"id": 1, "result": {}});
        assert_eq!(classify_message(&json), MessageKind::Response);
    }

    #[test]
    fn classify_incoming_request() {
        let json = serde_json::json!({"id": 1, "method": "tool.call", "params": {}});
        assert_eq!(
            classify_message(&json),
            MessageKind::IncomingRequest { id: 1 }
        );
    }

    #[test]
    fn classify_notification() {
        let json = serde_json::json!({"method": "session.event", "params": {}});
        assert_eq!(classify_message(&json), MessageKind::Notification);
    }

    #[test]
    fn classify_no_id_no_method() {
        // Neither id nor method is treated as a notification
        let json = serde_json::json!({"data": "something"});
        assert_eq!(classify_message(&json), MessageKind::Notification);
    }

    #[test]
    fn port_announcement_parsing() {
        assert!(parse_port_announcement("Starting up...").is_none());
        assert_eq!(
            parse_port_announcement("CLI server listening on port 4321\n")
                .unwrap()
                .unwrap(),
            4321
        );
        assert!(
            parse_port_announcement("CLI server listening on port banana")
                .unwrap()
                .is_err()
        );
    }

    #[tokio::test]
    async fn frame_written_then_read_back() {
        let mut buf = Vec::new();
        write_frame(&mut buf, r#"{"id":1}"#).await.unwrap();
        assert!(buf.starts_with(b"Content-Length: 8\r\n\r\n"));

        let mut reader = BufReader::new(buf.as_slice());
        let mut line = String::new();
        let body = read_frame(&mut reader, &mut line).await.unwrap().unwrap();
        assert_eq!(body, br#"{"id":1}"#);
        assert!(read_frame(&mut reader, &mut line).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn extra_headers_are_skipped() {
        let raw = b"Content-Length: 2\r\nContent-Type: application/json\r\n\r\n{}";
        let mut reader = BufReader::new(&raw[..]);
        let mut line = String::new();
        let body = read_frame(&mut reader, &mut line).await.unwrap().unwrap();
        assert_eq!(body, b"{}");
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let raw = b"Content-Length: 10\r\n\r\n{}";
        let mut reader = BufReader::new(&raw[..]);
        let mut line = String::new();
        assert!(read_frame(&mut reader, &mut line).await.is_err());
    }
}
