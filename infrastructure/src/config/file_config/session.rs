//! Session settings from TOML (`[session]` section)

use oneshot_domain::{ConfigIssue, ConfigIssueCode, DEFAULT_TIMEOUT, Model};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[session]` configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Model the session is created with
    pub model: String,
    /// Optional system message appended to the service's instructions
    pub system_message: Option<String>,
    /// Seconds to wait for the complete response
    pub timeout_secs: u64,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            model: Model::default().to_string(),
            system_message: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl FileSessionConfig {
    /// Parse the model, reporting an empty name as an issue.
    pub fn parse_model(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        let trimmed = self.model.trim();
        if trimmed.is_empty() {
            return (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::EmptyField {
                        field: "session.model".to_string(),
                    },
                    "session.model is empty",
                )],
            );
        }
        (Some(Model::from_id(trimmed)), Vec::new())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
