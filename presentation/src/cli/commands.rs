//! CLI command definitions

use clap::{Parser, ValueEnum};
use oneshot_domain::OutputFormat;
use std::path::PathBuf;

/// Output format for the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// The response content only
    Text,
    /// The full response as JSON
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for copilot-oneshot
///
/// Flags left unset fall back to the configuration files, so their defaults
/// are documented rather than declared.
#[derive(Parser, Debug)]
#[command(name = "copilot-oneshot")]
#[command(author, version, about = "Send one prompt to GitHub Copilot and print the reply")]
#[command(long_about = r#"
Copilot Oneshot starts the GitHub Copilot CLI in server mode, opens a single
session, sends one prompt, waits for the complete reply and prints it.
The session and the CLI server are always torn down afterwards.

Configuration files are loaded from (lowest to highest priority):
1. ~/.config/copilot-oneshot/config.toml   Global config
2. ./oneshot.toml or ./.oneshot.toml       Project-level config
3. --config <path>                         Explicit config file
4. COPILOT_ONESHOT_* environment variables (e.g. COPILOT_ONESHOT_SESSION__MODEL)

Example:
  copilot-oneshot
  copilot-oneshot -m claude-sonnet-4.5 "Explain Rust lifetimes in one paragraph"
  copilot-oneshot -t 120 -o json "write fizzbuzz in Haskell"
"#)]
pub struct Cli {
    /// The prompt to send
    #[arg(default_value = "write fizzbuzz")]
    pub prompt: String,

    /// Model for the session [default: gpt-4.1]
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Seconds to wait for the complete response [default: 60]
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// System message appended to the session's instructions
    #[arg(long, value_name = "TEXT")]
    pub system: Option<String>,

    /// Output format [default: text]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormatArg>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to the copilot executable
    #[arg(long, value_name = "PATH")]
    pub cli_path: Option<PathBuf>,

    /// Connect to a running Copilot CLI server (host:port or port)
    #[arg(long, value_name = "URL", conflicts_with = "cli_path")]
    pub cli_url: Option<String>,

    /// Append a JSONL transcript of the run to this file
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
