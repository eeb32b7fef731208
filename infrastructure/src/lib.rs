//! Infrastructure layer for copilot-oneshot
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod copilot;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileConfig, FileCopilotConfig, FileOutputConfig, FileSessionConfig,
};
pub use copilot::{
    error::{CopilotError, Result},
    gateway::{CopilotLlmGateway, CopilotOptions},
    router::MessageRouter,
    session::CopilotSession,
};
pub use logging::JsonlConversationLogger;
