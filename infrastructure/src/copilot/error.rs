//! Error types for the Copilot adapter

use thiserror::Error;

/// Result type alias for Copilot operations
pub type Result<T> = std::result::Result<T, CopilotError>;

/// Errors that can occur when communicating with Copilot CLI
#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("Copilot CLI not found: {0}")]
    CliNotFound(String),

    #[error("I/O error talking to Copilot CLI: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to parse response: {error}\nRaw response: {raw}")]
    ParseError { error: String, raw: String },

    #[error("JSON-RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Protocol version mismatch: server speaks {server}, client supports {supported}")]
    ProtocolMismatch { server: u64, supported: u64 },

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Router stopped (connection to Copilot CLI closed)")]
    RouterStopped,

    #[error("Request timeout: {0}")]
    Timeout(String),
}
