//! Copilot CLI connection settings from TOML (`[copilot]` section)

use crate::copilot::gateway::CopilotOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw `[copilot]` configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCopilotConfig {
    /// Path to the `copilot` executable (looked up on `PATH` when unset)
    pub cli_path: Option<PathBuf>,
    /// Extra arguments for the spawned CLI
    pub cli_args: Vec<String>,
    /// Connect to a running server (`host:port` or a bare port) instead of spawning one
    pub cli_url: Option<String>,
    /// `--log-level` for the spawned CLI
    pub log_level: Option<String>,
}

impl FileCopilotConfig {
    /// Convert to gateway options.
    pub fn to_options(&self) -> CopilotOptions {
        CopilotOptions {
            cli_path: self.cli_path.clone(),
            cli_args: self.cli_args.clone(),
            cli_url: self
                .cli_url
                .as_ref()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            log_level: self.log_level.clone(),
        }
    }

    /// Whether `cli_url` looks like `host:port` or a bare port.
    pub fn cli_url_is_valid(&self) -> bool {
        let Some(url) = &self.cli_url else {
            return true;
        };
        let url = url
            .trim()
            .trim_start_matches("http://")
            .trim_start_matches("tcp://");
        if url.parse::<u16>().is_ok() {
            return true;
        }
        match url.rsplit_once(':') {
            Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
            None => false,
        }
    }
}
