//! Domain layer for copilot-oneshot
//!
//! Value objects describing one exchange with the Copilot CLI: the model a
//! session is created for, the request sent to it and the response it
//! returns. No I/O lives here.

pub mod config;
pub mod core;
pub mod session;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{error::DomainError, model::Model};
pub use session::{
    config::SessionConfig,
    request::{DEFAULT_TIMEOUT, Request},
    response::Response,
};
