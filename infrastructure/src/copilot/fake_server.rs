//! In-process stand-in for the Copilot CLI server, for tests.

use crate::copilot::router::{BoxedReader, BoxedWriter, MessageRouter};
use crate::copilot::transport::{read_frame, write_frame};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::TcpListener;

pub(crate) struct FakeServer {
    reader: BufReader<BoxedReader>,
    writer: BoxedWriter,
    line: String,
}

impl FakeServer {
    /// A router connected to a fresh fake server.
    pub(crate) fn pair() -> (Arc<MessageRouter>, Self) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client);
        let (server_read, server_write) = tokio::io::split(server);

        let router = MessageRouter::from_parts(Box::new(client_read), Box::new(client_write), None);
        (router, Self::new(Box::new(server_read), Box::new(server_write)))
    }

    /// Serve the first client that connects to `listener`.
    pub(crate) async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, write_half) = stream.into_split();
        Self::new(Box::new(read_half), Box::new(write_half))
    }

    fn new(reader: BoxedReader, writer: BoxedWriter) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            line: String::new(),
        }
    }

    /// Next frame the client wrote, parsed as JSON.
    pub(crate) async fn next_request(&mut self) -> serde_json::Value {
        let body = read_frame(&mut self.reader, &mut self.line)
            .await
            .unwrap()
            .expect("client closed the connection");
        serde_json::from_slice(&body).unwrap()
    }

    /// Like [`next_request`](Self::next_request), but `None` once the client
    /// has closed the connection.
    pub(crate) async fn try_next_request(&mut self) -> Option<serde_json::Value> {
        match read_frame(&mut self.reader, &mut self.line).await {
            Ok(Some(body)) => Some(serde_json::from_slice(&body).unwrap()),
            _ => None,
        }
    }

    pub(crate) async fn send_raw(&mut self, value: serde_json::Value) {
        write_frame(&mut self.writer, &value.to_string())
            .await
            .unwrap();
    }

    pub(crate) async fn respond(&mut self, request: &serde_json::Value, result: serde_json::Value) {
        self.send_raw(serde_json::json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "result": result,
        }))
        .await;
    }

    pub(crate) async fn respond_error(&mut self, request: &serde_json::Value, code: i64, message: &str) {
        self.send_raw(serde_json::json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": { "code": code, "message": message },
        }))
        .await;
    }

    pub(crate) async fn session_event(
        &mut self,
        session_id: &str,
        event_type: &str,
        data: serde_json::Value,
    ) {
        self.send_raw(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "session.event",
            "params": {
                "sessionId": session_id,
                "event": { "type": event_type, "data": data },
            },
        }))
        .await;
    }
}
