//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod copilot;
mod output;
mod session;

pub use copilot::FileCopilotConfig;
pub use output::FileOutputConfig;
pub use session::FileSessionConfig;

use oneshot_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// How to reach the Copilot CLI
    pub copilot: FileCopilotConfig,
    /// Session model, system message and timeout
    pub session: FileSessionConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.session.parse_model().1);

        if self.session.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroTimeout,
                "session.timeout_secs is 0: every request will time out",
            ));
        }

        if !self.copilot.cli_url_is_valid() {
            let value = self.copilot.cli_url.clone().unwrap_or_default();
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidCliUrl {
                    value: value.clone(),
                },
                format!("copilot.cli_url: '{}' is not host:port or a port", value),
            ));
        }

        issues
    }

    /// Render as TOML (for `--print-config`).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneshot_domain::{Model, OutputFormat, Severity};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[copilot]
cli_path = "/opt/copilot/bin/copilot"
cli_args = ["--allow-all-tools"]
log_level = "debug"

[session]
model = "claude-sonnet-4.5"
system_message = "Answer with code only"
timeout_secs = 120

[output]
format = "json"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.copilot.cli_args, vec!["--allow-all-tools"]);
        assert_eq!(config.copilot.log_level.as_deref(), Some("debug"));
        assert_eq!(config.session.parse_model().0, Some(Model::ClaudeSonnet45));
        assert_eq!(config.session.timeout_secs, 120);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.output.color);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[session]\ntimeout_secs = 5\n").unwrap();
        assert_eq!(config.session.timeout_secs, 5);
        assert_eq!(config.session.model, "gpt-4.1");
        assert!(config.copilot.cli_url.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(FileConfig::default().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_each_issue() {
        let mut config = FileConfig::default();
        config.session.model = " ".to_string();
        config.session.timeout_secs = 0;
        config.copilot.cli_url = Some("nowhere".to_string());

        let issues = config.validate();
        assert_eq!(issues.len(), 3);
        assert_eq!(
            issues.iter().filter(|i| i.severity == Severity::Error).count(),
            2
        );
        assert!(issues.iter().any(|i| i.code == ConfigIssueCode::ZeroTimeout));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let config = FileConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: FileConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
