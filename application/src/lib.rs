//! Application layer for copilot-oneshot
//!
//! This crate contains the session lifecycle use case and the port
//! definitions it drives. It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::run_prompt::{RunPromptError, RunPromptInput, RunPromptUseCase};
