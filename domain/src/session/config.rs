//! Session configuration value object

use crate::core::{error::DomainError, model::Model};
use serde::{Deserialize, Serialize};

/// Configuration a session is created under.
///
/// A session is scoped to exactly one model; the optional system message is
/// appended to the service's own instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    model: Model,
    system_message: Option<String>,
}

impl SessionConfig {
    /// Create a configuration for `model`.
    ///
    /// Fails with [`DomainError::InvalidModel`] when the identifier is blank.
    pub fn new(model: Model) -> Result<Self, DomainError> {
        if model.as_str().trim().is_empty() {
            return Err(DomainError::InvalidModel(model.as_str().to_string()));
        }
        Ok(Self {
            model,
            system_message: None,
        })
    }

    /// Attach a system message. Blank messages are ignored.
    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.system_message = if message.trim().is_empty() {
            None
        } else {
            Some(message)
        };
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn system_message(&self) -> Option<&str> {
        self.system_message.as_deref()
    }
}
