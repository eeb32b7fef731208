//! Copilot session management.
//!
//! Provides [`CopilotSession`] which implements [`LlmSession`] for one
//! conversation with a specific model through the Copilot CLI.

use crate::copilot::error::{CopilotError, Result};
use crate::copilot::protocol::{
    CreateSessionParams, CreateSessionResult, DestroySessionParams, SendParams, SendResult,
    SystemMessageConfig,
};
use crate::copilot::router::{MessageRouter, SessionChannel};
use async_trait::async_trait;
use oneshot_application::ports::llm_gateway::{GatewayError, LlmSession};
use oneshot_domain::{Model, Request, Response, SessionConfig};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// An active conversation session with a specific Copilot model.
pub struct CopilotSession {
    router: Arc<MessageRouter>,
    channel: Mutex<SessionChannel>,
    session_id: String,
    model: Model,
}

impl CopilotSession {
    /// Create a session on the server and register its event channel.
    pub async fn create(router: Arc<MessageRouter>, config: &SessionConfig) -> Result<Self> {
        info!("Creating session with model: {}", config.model());

        let params = CreateSessionParams {
            model: Some(config.model().to_string()),
            system_message: config.system_message().map(SystemMessageConfig::append),
        };

        let result: CreateSessionResult = router.call("session.create", &params).await?;
        debug!("Session created: {}", result.session_id);

        let channel = router.register_session(&result.session_id);

        Ok(Self {
            router,
            channel: Mutex::new(channel),
            session_id: result.session_id,
            model: config.model().clone(),
        })
    }

    /// Returns the Copilot session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a prompt and wait until the session goes idle.
    ///
    /// Returns the final assistant text and the message id of the prompt.
    pub async fn ask(&self, prompt: &str) -> Result<(String, Option<String>)> {
        // Held for the whole exchange so turns cannot interleave.
        let mut channel = self.channel.lock().await;

        debug!("Sending to session {}: {}", self.session_id, prompt);
        let params = SendParams {
            session_id: self.session_id.clone(),
            prompt: prompt.to_string(),
        };
        // Unbounded: the caller owns the deadline for the whole turn.
        let result: SendResult = self
            .router
            .call_with_timeout("session.send", &params, None)
            .await?;
        debug!("session.send accepted (message id: {:?})", result.message_id);

        let content = channel.wait_for_idle().await?;
        Ok((content, result.message_id))
    }

    /// Destroy the session on the server and stop routing its events.
    pub async fn close(self) -> Result<()> {
        let params = DestroySessionParams {
            session_id: self.session_id.clone(),
        };
        let outcome: Result<serde_json::Value> =
            self.router.call("session.destroy", &params).await;

        // Deregisters the route whether or not the server acknowledged.
        drop(self.channel);

        outcome?;
        debug!("Session {} destroyed", self.session_id);
        Ok(())
    }
}

fn request_error(error: CopilotError) -> GatewayError {
    match error {
        CopilotError::RouterStopped => GatewayError::TransportClosed,
        other => GatewayError::RequestFailed(other.to_string()),
    }
}

#[async_trait]
impl LlmSession for CopilotSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn model(&self) -> &Model {
        &self.model
    }

    async fn send_and_wait(&self, request: &Request) -> std::result::Result<Response, GatewayError> {
        let (content, message_id) = self.ask(request.prompt()).await.map_err(request_error)?;

        let response = Response::new(content, self.session_id.clone(), self.model.as_str());
        Ok(match message_id {
            Some(id) => response.with_message_id(id),
            None => response,
        })
    }

    async fn destroy(self: Box<Self>) -> std::result::Result<(), GatewayError> {
        self.close()
            .await
            .map_err(|e| GatewayError::CleanupFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copilot::fake_server::FakeServer;

    fn gpt41() -> SessionConfig {
        SessionConfig::new(Model::Gpt41).unwrap()
    }

    #[tokio::test]
    async fn create_sends_model_and_system_message() {
        let (router, mut server) = FakeServer::pair();

        let server_task = tokio::spawn(async move {
            let request = server.next_request().await;
            assert_eq!(request["method"], "session.create");
            assert_eq!(request["params"]["model"], "gpt-4.1");
            assert_eq!(request["params"]["systemMessage"]["content"], "Answer in Rust");
            server
                .respond(&request, serde_json::json!({"sessionId": "s-1"}))
                .await;
            server
        });

        let config = gpt41().with_system_message("Answer in Rust");
        let session = CopilotSession::create(Arc::clone(&router), &config)
            .await
            .unwrap();
        assert_eq!(session.session_id(), "s-1");
        assert_eq!(router.active_sessions(), 1);
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn send_and_wait_returns_final_message() {
        let (router, mut server) = FakeServer::pair();

        let server_task = tokio::spawn(async move {
            let create = server.next_request().await;
            server
                .respond(&create, serde_json::json!({"sessionId": "s-1"}))
                .await;

            let send = server.next_request().await;
            assert_eq!(send["method"], "session.send");
            assert_eq!(send["params"]["sessionId"], "s-1");
            assert_eq!(send["params"]["prompt"], "write fizzbuzz");
            server
                .respond(&send, serde_json::json!({"messageId": "m-1"}))
                .await;
            server
                .session_event("s-1", "assistant.message", serde_json::json!({"content": "draft"}))
                .await;
            server
                .session_event("s-1", "assistant.message", serde_json::json!({"content": "final"}))
                .await;
            server.session_event("s-1", "session.idle", serde_json::json!({})).await;
            server
        });

        let session = CopilotSession::create(router, &gpt41()).await.unwrap();
        let response = session
            .send_and_wait(&Request::new("write fizzbuzz").unwrap())
            .await
            .unwrap();

        assert_eq!(response.content, "final");
        assert_eq!(response.message_id.as_deref(), Some("m-1"));
        assert_eq!(response.model, "gpt-4.1");
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn rejected_send_is_a_request_failure() {
        let (router, mut server) = FakeServer::pair();

        let server_task = tokio::spawn(async move {
            let create = server.next_request().await;
            server
                .respond(&create, serde_json::json!({"sessionId": "s-1"}))
                .await;
            let send = server.next_request().await;
            server.respond_error(&send, -32000, "rate limited").await;
            server
        });

        let session = CopilotSession::create(router, &gpt41()).await.unwrap();
        let err = session
            .send_and_wait(&Request::new("hi").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::RequestFailed(msg) if msg.contains("rate limited")));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn destroy_deregisters_even_when_server_refuses() {
        let (router, mut server) = FakeServer::pair();

        let server_task = tokio::spawn(async move {
            let create = server.next_request().await;
            server
                .respond(&create, serde_json::json!({"sessionId": "s-1"}))
                .await;
            let destroy = server.next_request().await;
            assert_eq!(destroy["method"], "session.destroy");
            assert_eq!(destroy["params"]["sessionId"], "s-1");
            server.respond_error(&destroy, -32001, "no such session").await;
            server
        });

        let session: Box<dyn LlmSession> =
            Box::new(CopilotSession::create(Arc::clone(&router), &gpt41()).await.unwrap());
        let err = session.destroy().await.unwrap_err();

        assert!(matches!(err, GatewayError::CleanupFailed(_)));
        assert_eq!(router.active_sessions(), 0);
        server_task.await.unwrap();
    }
}
