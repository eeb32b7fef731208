//! Configuration file loading for copilot-oneshot
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `COPILOT_ONESHOT_*` (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./oneshot.toml` or `./.oneshot.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/copilot-oneshot/config.toml`
//! 5. Default values
//!
//! CLI flags are applied on top by the binary.

mod file_config;
mod loader;

pub use file_config::{FileConfig, FileCopilotConfig, FileOutputConfig, FileSessionConfig};
pub use loader::ConfigLoader;
