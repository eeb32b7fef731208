//! LLM Gateway port
//!
//! Defines the client and session capabilities the lifecycle driver talks
//! to. Implementations (adapters) live in the infrastructure layer.

use async_trait::async_trait;
use oneshot_domain::{Model, Request, Response, SessionConfig};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The service could not be reached when starting the client.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The service rejected the session configuration (e.g. unknown model).
    #[error("Session creation failed: {0}")]
    SessionCreationError(String),

    /// No complete response arrived before the deadline.
    #[error("Timed out after {0:?} waiting for a response")]
    Timeout(Duration),

    /// The service reported an explicit failure for the request.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Releasing a session or the client failed.
    #[error("Cleanup failed: {0}")]
    CleanupFailed(String),

    #[error("Client not started")]
    NotStarted,

    #[error("Transport closed")]
    TransportClosed,
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }
}

/// Client handle to the remote service.
///
/// The driver owns the gateway for its whole lifetime: `start` before any
/// session is created, `stop` after every session has been destroyed.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Establish the connection to the service.
    async fn start(&self) -> Result<(), GatewayError>;

    /// Release the connection. Must only be called once no session is active.
    async fn stop(&self) -> Result<(), GatewayError>;

    /// Create a new session scoped to `config`'s model.
    async fn create_session(
        &self,
        config: &SessionConfig,
    ) -> Result<Box<dyn LlmSession>, GatewayError>;
}

/// An active LLM session
///
/// `destroy` consumes the handle, so a destroyed session cannot be used.
#[async_trait]
pub trait LlmSession: Send + Sync {
    /// Identifier assigned by the service
    fn session_id(&self) -> &str;

    /// Get the model used by this session
    fn model(&self) -> &Model;

    /// Send a prompt and wait until the service reports the turn complete.
    ///
    /// Implementations do not apply `request.timeout()` themselves; the
    /// caller bounds this future.
    async fn send_and_wait(&self, request: &Request) -> Result<Response, GatewayError>;

    /// Tear the session down on the service side.
    async fn destroy(self: Box<Self>) -> Result<(), GatewayError>;
}
