//! Copilot LLM Gateway implementation
//!
//! [`CopilotLlmGateway`] is the client handle: `start` launches (or attaches
//! to) a Copilot CLI server and checks its protocol version, `stop` closes
//! the connection and terminates the process it launched.

use crate::copilot::error::{CopilotError, Result};
use crate::copilot::protocol::{PingParams, PingResult, SUPPORTED_PROTOCOL_VERSION};
use crate::copilot::router::{MessageRouter, SpawnOptions};
use crate::copilot::session::CopilotSession;
use async_trait::async_trait;
use oneshot_application::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use oneshot_domain::SessionConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Name of the Copilot CLI executable looked up on `PATH`.
const DEFAULT_CLI: &str = "copilot";

/// How the gateway reaches a Copilot CLI server.
#[derive(Debug, Clone, Default)]
pub struct CopilotOptions {
    /// Explicit CLI executable; `PATH` lookup when unset.
    pub cli_path: Option<PathBuf>,
    /// Extra arguments for the spawned CLI.
    pub cli_args: Vec<String>,
    /// Address of an already running server (`host:port`). Nothing is
    /// spawned when set.
    pub cli_url: Option<String>,
    /// `--log-level` passed to the spawned CLI.
    pub log_level: Option<String>,
}

/// LLM Gateway implementation for GitHub Copilot CLI
pub struct CopilotLlmGateway {
    options: CopilotOptions,
    /// Pre-built router consumed by the first `start`.
    attached: Mutex<Option<Arc<MessageRouter>>>,
    router: Mutex<Option<Arc<MessageRouter>>>,
}

impl CopilotLlmGateway {
    /// Create a gateway; nothing is spawned until [`start`](LlmGateway::start).
    pub fn new(options: CopilotOptions) -> Self {
        Self {
            options,
            attached: Mutex::new(None),
            router: Mutex::new(None),
        }
    }

    /// Create a gateway over an existing router
    pub fn with_router(router: Arc<MessageRouter>) -> Self {
        Self {
            options: CopilotOptions::default(),
            attached: Mutex::new(Some(router)),
            router: Mutex::new(None),
        }
    }

    fn resolve_cli(&self) -> Result<PathBuf> {
        match &self.options.cli_path {
            Some(path) => Ok(path.clone()),
            None => which::which(DEFAULT_CLI)
                .map_err(|e| CopilotError::CliNotFound(format!("{} ({})", DEFAULT_CLI, e))),
        }
    }

    async fn connect(&self) -> Result<Arc<MessageRouter>> {
        if let Some(router) = self.attached.lock().await.take() {
            return Ok(router);
        }

        match &self.options.cli_url {
            Some(url) => MessageRouter::connect(&normalize_address(url)).await,
            None => {
                let spawn = SpawnOptions {
                    program: self.resolve_cli()?,
                    args: self.options.cli_args.clone(),
                    log_level: self.options.log_level.clone(),
                };
                MessageRouter::spawn(&spawn).await
            }
        }
    }

    /// Ping the server and check it speaks our protocol version.
    async fn verify_protocol(router: &MessageRouter) -> Result<()> {
        let ping: PingResult = router
            .call(
                "ping",
                &PingParams {
                    message: "copilot-oneshot".to_string(),
                },
            )
            .await?;

        match ping.protocol_version {
            Some(server) if server != SUPPORTED_PROTOCOL_VERSION => {
                Err(CopilotError::ProtocolMismatch {
                    server,
                    supported: SUPPORTED_PROTOCOL_VERSION,
                })
            }
            Some(_) => Ok(()),
            None => {
                warn!("Copilot CLI did not report a protocol version");
                Ok(())
            }
        }
    }

    async fn started_router(&self) -> std::result::Result<Arc<MessageRouter>, GatewayError> {
        self.router
            .lock()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(GatewayError::NotStarted)
    }
}

/// Accept a bare port as shorthand for `127.0.0.1:<port>`.
fn normalize_address(url: &str) -> String {
    let trimmed = url
        .trim()
        .trim_start_matches("http://")
        .trim_start_matches("tcp://");
    if trimmed.parse::<u16>().is_ok() {
        format!("127.0.0.1:{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl LlmGateway for CopilotLlmGateway {
    async fn start(&self) -> std::result::Result<(), GatewayError> {
        let mut slot = self.router.lock().await;
        if slot.is_some() {
            debug!("Copilot client already started");
            return Ok(());
        }

        let router = self
            .connect()
            .await
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        if let Err(e) = Self::verify_protocol(&router).await {
            if let Err(shutdown_err) = router.shutdown().await {
                debug!("Shutdown after failed handshake: {}", shutdown_err);
            }
            return Err(GatewayError::ConnectionError(e.to_string()));
        }

        info!("Copilot client started");
        *slot = Some(router);
        Ok(())
    }

    async fn stop(&self) -> std::result::Result<(), GatewayError> {
        let Some(router) = self.router.lock().await.take() else {
            debug!("Copilot client not started, nothing to stop");
            return Ok(());
        };

        let active = router.active_sessions();
        if active > 0 {
            warn!("Stopping Copilot client with {} session(s) still active", active);
        }

        router
            .shutdown()
            .await
            .map_err(|e| GatewayError::CleanupFailed(e.to_string()))?;
        info!("Copilot client stopped");
        Ok(())
    }

    async fn create_session(
        &self,
        config: &SessionConfig,
    ) -> std::result::Result<Box<dyn LlmSession>, GatewayError> {
        let router = self.started_router().await?;
        let session = CopilotSession::create(router, config)
            .await
            .map_err(|e| GatewayError::SessionCreationError(e.to_string()))?;

        Ok(Box::new(session))
    }
}
