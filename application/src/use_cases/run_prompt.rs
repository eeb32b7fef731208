//! Run Prompt use case.
//!
//! The session lifecycle driver: start the client, create one session, send
//! one request, wait for the reply or the deadline, then destroy the session
//! and stop the client.
//!
//! Release is guaranteed for everything that was acquired. Each resource is
//! released by the frame that acquired it, after the inner steps have
//! produced their result:
//!
//! ```text
//! start ─┬─ create ─┬─ send_and_wait (bounded by timeout)
//!        │          └─ destroy   (only if create succeeded)
//!        └─ stop                 (only if start succeeded)
//! ```
//!
//! When cleanup fails while an earlier error is already propagating, the
//! earlier error is returned and the cleanup failure is logged.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use oneshot_domain::{Request, Response, SessionConfig};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while running a prompt.
#[derive(Error, Debug)]
pub enum RunPromptError {
    /// A lifecycle step failed (connect, create, send, timeout).
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Every step succeeded but releasing a resource did not.
    #[error("Cleanup failed after a successful exchange: {0}")]
    Cleanup(#[source] GatewayError),
}

impl RunPromptError {
    /// The underlying gateway error, whichever step produced it.
    pub fn gateway_error(&self) -> &GatewayError {
        match self {
            RunPromptError::Gateway(e) | RunPromptError::Cleanup(e) => e,
        }
    }
}

/// Input for the [`RunPromptUseCase`].
#[derive(Debug, Clone)]
pub struct RunPromptInput {
    /// Configuration the session is created with.
    pub session: SessionConfig,
    /// The single request to send.
    pub request: Request,
}

impl RunPromptInput {
    pub fn new(session: SessionConfig, request: Request) -> Self {
        Self { session, request }
    }
}

/// Use case driving one request/response exchange end to end.
pub struct RunPromptUseCase {
    gateway: Arc<dyn LlmGateway>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl RunPromptUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Execute without progress reporting.
    pub async fn execute(&self, input: RunPromptInput) -> Result<Response, RunPromptError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute with progress callbacks.
    pub async fn execute_with_progress(
        &self,
        input: RunPromptInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<Response, RunPromptError> {
        info!("Running prompt with model {}", input.session.model());

        progress.on_connecting();
        if let Err(e) = self.gateway.start().await {
            // Nothing acquired yet, nothing to release.
            progress.on_failure(&e.to_string());
            return Err(e.into());
        }
        debug!("Client started");

        let outcome = self.run_session(&input, progress).await;
        if let Err(e) = &outcome {
            progress.on_failure(&e.to_string());
        }

        let stopped = self.gateway.stop().await;
        self.conversation_logger.log(ConversationEvent::new(
            "client_stopped",
            serde_json::json!({ "ok": stopped.is_ok() }),
        ));
        progress.on_finished();

        Self::settle(outcome, stopped, "client stop")
    }

    /// Steps 2-5: create the session, exchange, destroy.
    async fn run_session(
        &self,
        input: &RunPromptInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<Response, RunPromptError> {
        let session = self.gateway.create_session(&input.session).await?;
        let session_id = session.session_id().to_string();

        info!("Session {} created ({})", session_id, session.model());
        progress.on_session_created(&session_id, session.model());
        self.conversation_logger.log(ConversationEvent::new(
            "session_created",
            serde_json::json!({
                "session_id": session_id,
                "model": session.model().as_str(),
            }),
        ));

        let outcome = self
            .send_and_wait(session.as_ref(), &input.request, progress)
            .await;

        let destroyed = session.destroy().await;
        debug!("Session {} destroyed (ok: {})", session_id, destroyed.is_ok());
        self.conversation_logger.log(ConversationEvent::new(
            "session_destroyed",
            serde_json::json!({ "session_id": session_id, "ok": destroyed.is_ok() }),
        ));

        Self::settle(outcome, destroyed, "session destroy")
    }

    /// Step 3-4: send and wait, bounded by the request's timeout.
    async fn send_and_wait(
        &self,
        session: &dyn LlmSession,
        request: &Request,
        progress: &dyn ProgressNotifier,
    ) -> Result<Response, RunPromptError> {
        let timeout = request.effective_timeout();

        self.conversation_logger.log(ConversationEvent::new(
            "prompt_sent",
            serde_json::json!({
                "session_id": session.session_id(),
                "prompt": request.prompt(),
                "timeout_secs": timeout.as_secs_f64(),
            }),
        ));
        progress.on_waiting(timeout);

        let result = match tokio::time::timeout(timeout, session.send_and_wait(request)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(timeout)),
        };

        match result {
            Ok(response) => {
                if !response.has_content() {
                    warn!("Session {} returned an empty response", session.session_id());
                }
                self.conversation_logger.log(ConversationEvent::new(
                    "response_received",
                    serde_json::json!({
                        "session_id": session.session_id(),
                        "message_id": response.message_id,
                        "content": response.content,
                    }),
                ));
                progress.on_response(&response);
                Ok(response)
            }
            Err(e) => {
                warn!("Request on session {} failed: {}", session.session_id(), e);
                self.conversation_logger.log(ConversationEvent::new(
                    "request_failed",
                    serde_json::json!({
                        "session_id": session.session_id(),
                        "error": e.to_string(),
                        "timeout": e.is_timeout(),
                    }),
                ));
                Err(e.into())
            }
        }
    }

    /// Combine a step's outcome with the result of releasing its resource.
    ///
    /// The first error wins; a cleanup failure only surfaces on its own
    /// when everything before it succeeded.
    fn settle(
        outcome: Result<Response, RunPromptError>,
        cleanup: Result<(), GatewayError>,
        step: &str,
    ) -> Result<Response, RunPromptError> {
        match (outcome, cleanup) {
            (Ok(response), Ok(())) => Ok(response),
            (Ok(_), Err(e)) => Err(RunPromptError::Cleanup(e)),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup_err)) => {
                warn!("{} failed while handling '{}': {}", step, e, cleanup_err);
                Err(e)
            }
        }
    }
}
