//! Transport demultiplexer for the Copilot CLI connection.
//!
//! The Copilot CLI speaks JSON-RPC 2.0 over a single connection. Responses
//! to our requests, `session.event` notifications and requests initiated by
//! the CLI all arrive interleaved on the same stream.
//!
//! [`MessageRouter`] runs a single background reader task that owns the read
//! half exclusively and dispatches each frame:
//!
//! - **Response** → the `oneshot` registered by [`MessageRouter::request`]
//! - **`session.event`** → the [`SessionChannel`] registered for its `sessionId`
//! - **Incoming request** (`tool.call`, `permission.request`, ...) → answered
//!   with a "method not found" error, since this client registers no handlers
//!
//! Outgoing frames go through a writer task fed by a channel, so a caller
//! dropped mid-send (e.g. on timeout) never leaves half a frame on the wire.

use crate::copilot::error::{CopilotError, Result};
use crate::copilot::protocol::{
    JsonRpcErrorOut, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
};
use crate::copilot::transport::{
    MessageKind, classify_message, parse_port_announcement, read_frame, write_frame,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// How long the spawned CLI may take to announce its port.
const PORT_ANNOUNCE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a control request (`ping`, `session.create`, ...) may wait for
/// its response. `session.send` is not bounded here.
pub const CONTROL_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

type Routes = Arc<std::sync::RwLock<HashMap<String, mpsc::UnboundedSender<SessionEvent>>>>;
type PendingResponses = Arc<std::sync::Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;
type Outbox = mpsc::UnboundedSender<Outgoing>;

/// Work for the writer task.
enum Outgoing {
    /// Write one frame; `done` receives the write result if someone waits.
    Frame {
        body: String,
        done: Option<oneshot::Sender<Result<()>>>,
    },
    /// Shut the write half down and stop.
    Close { done: oneshot::Sender<()> },
}

/// Removes a pending response slot when the waiting request goes away,
/// whether it completed, failed or was cancelled.
struct PendingSlot<'a> {
    pending: &'a PendingResponses,
    id: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

/// A `session.event` notification routed to one session.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub event_type: String,
    pub event: serde_json::Value,
}

/// How to launch `copilot --server`.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    /// Executable to run.
    pub program: std::path::PathBuf,
    /// Extra arguments appended after `--server`.
    pub args: Vec<String>,
    /// Value for `--log-level`, if any.
    pub log_level: Option<String>,
}

/// Demultiplexes one Copilot CLI connection between request correlation and
/// per-session event channels.
pub struct MessageRouter {
    /// Background reader task handle.
    reader_handle: JoinHandle<()>,

    /// Background writer task handle.
    writer_handle: JoinHandle<()>,

    /// Session-specific event channels (session_id -> sender).
    ///
    /// `std::sync::RwLock` so [`SessionChannel::drop`] can deregister
    /// synchronously. Only held for map insert/remove.
    routes: Routes,

    /// Request-response correlation (request_id -> oneshot sender).
    pending_responses: PendingResponses,

    /// Set by the reader task when the connection ends.
    closed: Arc<AtomicBool>,

    /// Frames queued for the writer task.
    outbox: Outbox,

    /// Spawned Copilot CLI process, if we own one.
    child: Mutex<Option<Child>>,
}

impl MessageRouter {
    /// Spawn `copilot --server`, wait for its port announcement and connect.
    pub async fn spawn(options: &SpawnOptions) -> Result<Arc<Self>> {
        debug!(
            "Spawning Copilot CLI: {} --server {:?}",
            options.program.display(),
            options.args
        );

        let mut cmd = Command::new(&options.program);
        cmd.arg("--server");
        if let Some(level) = &options.log_level {
            cmd.arg("--log-level").arg(level);
        }
        cmd.args(&options.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|e| Self::spawn_error(&options.program, e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            CopilotError::Io(std::io::Error::other("Failed to capture stdout"))
        })?;
        let mut stdout_reader = BufReader::new(stdout);

        let port = match tokio::time::timeout(
            PORT_ANNOUNCE_TIMEOUT,
            Self::wait_for_port(&mut stdout_reader),
        )
        .await
        {
            Ok(Ok(port)) => port,
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return Err(e);
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(CopilotError::Timeout(
                    "Copilot CLI did not announce a port".into(),
                ));
            }
        };

        // Keep draining stdout so the child never blocks on a full pipe.
        tokio::spawn(async move {
            let mut line = String::new();
            loop {
                line.clear();
                match stdout_reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => trace!("Copilot CLI output: {}", line.trim_end()),
                }
            }
        });

        info!("Copilot CLI listening on port {}, connecting...", port);

        let stream = match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = child.kill().await;
                return Err(e.into());
            }
        };
        let (read_half, write_half) = stream.into_split();

        Ok(Self::from_parts(
            Box::new(read_half),
            Box::new(write_half),
            Some(child),
        ))
    }

    /// Connect to an already running Copilot CLI server.
    pub async fn connect(address: &str) -> Result<Arc<Self>> {
        info!("Connecting to Copilot CLI server at {}", address);
        let stream = TcpStream::connect(address).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self::from_parts(
            Box::new(read_half),
            Box::new(write_half),
            None,
        ))
    }

    /// Build a router over an arbitrary byte stream.
    ///
    /// `child` is killed on [`shutdown`](Self::shutdown) or drop.
    pub fn from_parts(reader: BoxedReader, writer: BoxedWriter, child: Option<Child>) -> Arc<Self> {
        let routes: Routes = Arc::new(std::sync::RwLock::new(HashMap::new()));
        let pending_responses: PendingResponses =
            Arc::new(std::sync::Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let (outbox, queue) = mpsc::unbounded_channel();

        let writer_handle = tokio::spawn(Self::writer_loop(BufWriter::new(writer), queue));
        let reader_handle = tokio::spawn(Self::reader_loop(
            BufReader::new(reader),
            Arc::clone(&routes),
            Arc::clone(&pending_responses),
            Arc::clone(&closed),
            outbox.clone(),
        ));

        Arc::new(Self {
            reader_handle,
            writer_handle,
            routes,
            pending_responses,
            closed,
            outbox,
            child: Mutex::new(child),
        })
    }

    fn spawn_error(program: &Path, error: std::io::Error) -> CopilotError {
        if error.kind() == std::io::ErrorKind::NotFound {
            CopilotError::CliNotFound(program.display().to_string())
        } else {
            CopilotError::Io(error)
        }
    }

    async fn wait_for_port<R>(stdout: &mut R) -> Result<u16>
    where
        R: tokio::io::AsyncBufRead + Unpin,
    {
        let mut line = String::new();
        loop {
            line.clear();
            if stdout.read_line(&mut line).await? == 0 {
                return Err(CopilotError::UnexpectedResponse(
                    "Copilot CLI exited without announcing port".into(),
                ));
            }
            debug!("Copilot CLI output: {}", line.trim());
            if let Some(port) = parse_port_announcement(&line) {
                return port;
            }
        }
    }

    /// Background writer loop, single owner of the write half.
    ///
    /// Each frame is written whole, even if the request that queued it has
    /// been dropped in the meantime.
    async fn writer_loop(
        mut writer: BufWriter<BoxedWriter>,
        mut queue: mpsc::UnboundedReceiver<Outgoing>,
    ) {
        while let Some(outgoing) = queue.recv().await {
            match outgoing {
                Outgoing::Frame { body, done } => {
                    let result = write_frame(&mut writer, &body).await;
                    match done {
                        Some(done) => {
                            let _ = done.send(result);
                        }
                        None => {
                            if let Err(e) = result {
                                warn!("Writer: failed to write frame: {}", e);
                            }
                        }
                    }
                }
                Outgoing::Close { done } => {
                    if let Err(e) = writer.shutdown().await {
                        debug!("Writer: shutdown failed: {}", e);
                    }
                    let _ = done.send(());
                    break;
                }
            }
        }
        debug!("Writer loop ended");
    }

    /// Background reader loop, single owner of the read half.
    ///
    /// When the loop exits every route and pending sender is dropped, so
    /// waiters observe [`CopilotError::RouterStopped`].
    async fn reader_loop(
        mut reader: BufReader<BoxedReader>,
        routes: Routes,
        pending_responses: PendingResponses,
        closed: Arc<AtomicBool>,
        outbox: Outbox,
    ) {
        let mut line = String::new();

        loop {
            let body = match read_frame(&mut reader, &mut line).await {
                Ok(Some(body)) => body,
                Ok(None) => {
                    debug!("Reader loop: connection closed");
                    break;
                }
                Err(e) => {
                    warn!("Reader loop: failed to read frame: {}", e);
                    break;
                }
            };

            trace!("Router received: {}", String::from_utf8_lossy(&body));

            let json_value: serde_json::Value = match serde_json::from_slice(&body) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Router: failed to parse JSON: {}", e);
                    continue;
                }
            };

            match classify_message(&json_value) {
                MessageKind::Response => {
                    let response: JsonRpcResponse = match serde_json::from_value(json_value) {
                        Ok(r) => r,
                        Err(e) => {
                            warn!("Router: failed to parse response: {}", e);
                            continue;
                        }
                    };
                    let Some(id) = response.id else { continue };
                    let sender = pending_responses
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .remove(&id);
                    match sender {
                        Some(tx) => {
                            let _ = tx.send(response);
                        }
                        None => debug!("Router: no pending receiver for response id={}", id),
                    }
                }

                MessageKind::IncomingRequest { id } => {
                    let method = json_value
                        .get("method")
                        .and_then(|m| m.as_str())
                        .unwrap_or_default();
                    warn!("Router: rejecting unsupported incoming request {}", method);
                    let reply = JsonRpcErrorOut::method_not_found(id, method);
                    if let Ok(body) = serde_json::to_string(&reply) {
                        let _ = outbox.send(Outgoing::Frame { body, done: None });
                    }
                }

                MessageKind::Notification => {
                    let notification: JsonRpcNotification =
                        match serde_json::from_value(json_value) {
                            Ok(n) => n,
                            Err(e) => {
                                warn!("Router: failed to parse notification: {}", e);
                                continue;
                            }
                        };

                    if notification.method != "session.event" {
                        trace!(
                            "Router: ignoring notification method={}",
                            notification.method
                        );
                        continue;
                    }

                    let Some(params) = notification.params else { continue };
                    let session_id = params.get("sessionId").and_then(|v| v.as_str());
                    let event = params.get("event");

                    let (Some(sid), Some(event)) = (session_id, event) else {
                        debug!("Router: session.event without sessionId/event");
                        continue;
                    };

                    let event_type = event
                        .get("type")
                        .and_then(|t| t.as_str())
                        .unwrap_or_default()
                        .to_string();

                    let routes_read = routes.read().unwrap_or_else(|e| e.into_inner());
                    match routes_read.get(sid) {
                        Some(tx) => {
                            let _ = tx.send(SessionEvent {
                                event_type,
                                event: event.clone(),
                            });
                        }
                        None => debug!(
                            "Router: no route for session_id={}, dropping event type={}",
                            sid, event_type
                        ),
                    }
                }
            }
        }

        info!("Router: reader loop ended, closing all session channels");
        closed.store(true, Ordering::SeqCst);
        routes.write().unwrap_or_else(|e| e.into_inner()).clear();
        pending_responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Whether the connection has ended.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a JSON-RPC request and wait for the correlated response, bounded
    /// by [`CONTROL_REQUEST_TIMEOUT`].
    pub async fn request(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        self.request_with_timeout(request, Some(CONTROL_REQUEST_TIMEOUT))
            .await
    }

    /// Send a JSON-RPC request and wait for the correlated response.
    ///
    /// With `timeout: None` the wait is unbounded and the caller is expected
    /// to bound it. Dropping the future releases the pending slot.
    pub async fn request_with_timeout(
        &self,
        request: &JsonRpcRequest,
        timeout: Option<Duration>,
    ) -> Result<JsonRpcResponse> {
        let (tx, rx) = oneshot::channel();
        self.pending_responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(request.id, tx);
        let _slot = PendingSlot {
            pending: &self.pending_responses,
            id: request.id,
        };

        if self.is_closed() {
            return Err(CopilotError::RouterStopped);
        }

        self.send_request(request).await?;

        let response = match timeout {
            Some(limit) => tokio::time::timeout(limit, rx).await.map_err(|_| {
                CopilotError::Timeout(format!("{} got no response", request.method))
            })?,
            None => rx.await,
        };
        response.map_err(|_| CopilotError::RouterStopped)
    }

    /// Call `method` with `params` and decode the result, bounded by
    /// [`CONTROL_REQUEST_TIMEOUT`].
    ///
    /// A JSON-RPC error object becomes [`CopilotError::RpcError`].
    pub async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        self.call_with_timeout(method, params, Some(CONTROL_REQUEST_TIMEOUT))
            .await
    }

    /// [`call`](Self::call) with an explicit bound; `None` waits until the
    /// server answers or the connection ends.
    pub async fn call_with_timeout<P, T>(
        &self,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
    ) -> Result<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let request = JsonRpcRequest::with_params(method, params)?;
        let response = self.request_with_timeout(&request, timeout).await?;

        if let Some(error) = response.error {
            return Err(CopilotError::RpcError {
                code: error.code,
                message: error.message,
            });
        }

        let result = response.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(result.clone()).map_err(|e| CopilotError::ParseError {
            error: e.to_string(),
            raw: result.to_string(),
        })
    }

    /// Queue a JSON-RPC request and wait until it is on the wire.
    pub async fn send_request(&self, request: &JsonRpcRequest) -> Result<()> {
        let body = serde_json::to_string(request)?;
        trace!("Router sending: {}", body);

        let (done, written) = oneshot::channel();
        self.outbox
            .send(Outgoing::Frame {
                body,
                done: Some(done),
            })
            .map_err(|_| CopilotError::RouterStopped)?;
        written.await.map_err(|_| CopilotError::RouterStopped)?
    }

    /// Requests still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.pending_responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Register a session and return the channel its events arrive on.
    pub fn register_session(self: &Arc<Self>, session_id: &str) -> SessionChannel {
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session_id.to_string(), tx);
        debug!("Router: registered session {}", session_id);

        SessionChannel {
            rx,
            session_id: session_id.to_string(),
            router: Arc::clone(self),
        }
    }

    /// Deregister a session from the routing table.
    ///
    /// Called by [`SessionChannel::drop`].
    pub fn deregister_session(&self, session_id: &str) {
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        if routes.remove(session_id).is_some() {
            debug!("Router: deregistered session {}", session_id);
        }
    }

    /// Number of sessions currently registered.
    pub fn active_sessions(&self) -> usize {
        self.routes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Close the connection and terminate the spawned CLI process, if any.
    pub async fn shutdown(&self) -> Result<()> {
        self.reader_handle.abort();
        self.closed.store(true, Ordering::SeqCst);

        let (done, flushed) = oneshot::channel();
        if self.outbox.send(Outgoing::Close { done }).is_ok()
            && tokio::time::timeout(CONTROL_REQUEST_TIMEOUT, flushed)
                .await
                .is_err()
        {
            debug!("Router: writer did not close in time");
        }
        self.writer_handle.abort();

        self.routes.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.pending_responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();

        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            match child.try_wait()? {
                Some(status) => debug!("Copilot CLI already exited: {}", status),
                None => {
                    child.kill().await?;
                    debug!("Copilot CLI process killed");
                }
            }
        }
        Ok(())
    }
}

impl Drop for MessageRouter {
    fn drop(&mut self) {
        self.reader_handle.abort();
        self.writer_handle.abort();
        if let Some(child) = self.child.get_mut().as_mut() {
            debug!("MessageRouter dropping, killing copilot-cli child process");
            let _ = child.start_kill();
        }
    }
}

/// Extract assistant text from an event's `data` payload.
///
/// Handles the shapes the Copilot CLI uses:
///
/// - `{ "data": { "content": "text" } }` — string content
/// - `{ "data": { "content": [{ "type": "text", "text": "..." }] } }` — content blocks
/// - `{ "data": { "message": { "content": "text" } } }` — nested message
/// - `{ "data": { "text": "..." } }` — direct text field
fn extract_event_text(event: &serde_json::Value) -> Option<String> {
    let data = event.get("data")?;

    if let Some(s) = data.get("content").and_then(|c| c.as_str())
        && !s.is_empty()
    {
        return Some(s.to_string());
    }

    if let Some(arr) = data.get("content").and_then(|c| c.as_array()) {
        let text = arr
            .iter()
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            return Some(text);
        }
    }

    if let Some(s) = data
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        && !s.is_empty()
    {
        return Some(s.to_string());
    }

    data.get("text")
        .and_then(|t| t.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A per-session channel for receiving routed events.
///
/// Deregisters itself from the router on drop.
pub struct SessionChannel {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    session_id: String,
    router: Arc<MessageRouter>,
}

impl SessionChannel {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Receive the next event, or [`CopilotError::RouterStopped`] once the
    /// connection has ended.
    pub async fn recv(&mut self) -> Result<SessionEvent> {
        self.rx.recv().await.ok_or(CopilotError::RouterStopped)
    }

    /// Read events until `session.idle` and return the final assistant text.
    ///
    /// The last complete `assistant.message` wins. Streamed deltas are the
    /// fallback when no complete message arrived, then `assistant.turn_end`.
    pub async fn wait_for_idle(&mut self) -> Result<String> {
        let mut last_message: Option<String> = None;
        let mut deltas = String::new();
        let mut turn_end_text: Option<String> = None;

        loop {
            let SessionEvent { event_type, event } = self.recv().await?;
            match event_type.as_str() {
                "assistant.message" | "assistant.message.completed" => {
                    if let Some(text) = extract_event_text(&event) {
                        last_message = Some(text);
                    }
                }
                "assistant.message_delta" | "assistant.message.delta" => {
                    if let Some(data) = event.get("data")
                        && let Some(chunk) = data
                            .get("deltaContent")
                            .or_else(|| data.get("content"))
                            .and_then(|c| c.as_str())
                    {
                        deltas.push_str(chunk);
                    }
                }
                "assistant.turn_end" => {
                    if let Some(text) = extract_event_text(&event) {
                        turn_end_text = Some(text);
                    }
                }
                "session.idle" => {
                    let content = last_message
                        .or_else(|| (!deltas.is_empty()).then_some(deltas))
                        .or(turn_end_text)
                        .unwrap_or_default();
                    debug!(
                        "Session {} idle ({} bytes)",
                        self.session_id,
                        content.len()
                    );
                    return Ok(content);
                }
                "session.error" => {
                    let message = event
                        .get("data")
                        .and_then(|d| d.get("message"))
                        .and_then(|m| m.as_str())
                        .unwrap_or("Unknown session error");
                    warn!("Session {} error: {}", self.session_id, message);
                    return Err(CopilotError::SessionError(message.to_string()));
                }
                other => trace!("Stream: {}", other),
            }
        }
    }
}

impl Drop for SessionChannel {
    fn drop(&mut self) {
        self.router.deregister_session(&self.session_id);
    }
}
