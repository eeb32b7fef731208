//! Copilot CLI adapter
//!
//! Implements [`LlmGateway`](oneshot_application::LlmGateway) and
//! [`LlmSession`](oneshot_application::LlmSession) for GitHub Copilot CLI.

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod router;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake_server;
