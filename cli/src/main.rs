//! CLI entrypoint for Copilot Oneshot
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use oneshot_application::{NoProgress, ProgressNotifier, RunPromptInput, RunPromptUseCase};
use oneshot_domain::{Request, SessionConfig};
use oneshot_infrastructure::{
    ConfigLoader, CopilotLlmGateway, FileConfig, JsonlConversationLogger,
};
use oneshot_presentation::{Cli, ConsoleFormatter, ProgressReporter, SimpleProgress};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };
    apply_overrides(&mut config, &cli);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    ConsoleFormatter::set_color(config.output.color);

    let issues = config.validate();
    for issue in &issues {
        eprintln!("{}", ConsoleFormatter::format_issue(issue));
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Invalid configuration");
    }

    // === Build the request ===
    let model = config
        .session
        .parse_model()
        .0
        .ok_or_else(|| anyhow!("No model configured"))?;
    let mut session = SessionConfig::new(model)?;
    if let Some(message) = &config.session.system_message {
        session = session.with_system_message(message.clone());
    }
    let request = Request::new(cli.prompt.clone())?.with_timeout(config.session.timeout());

    info!("Starting Copilot Oneshot");

    // === Dependency Injection ===
    let gateway = Arc::new(CopilotLlmGateway::new(config.copilot.to_options()));
    let mut use_case = RunPromptUseCase::new(gateway);
    if let Some(path) = &config.output.transcript {
        match JsonlConversationLogger::new(path) {
            Some(logger) => use_case = use_case.with_conversation_logger(Arc::new(logger)),
            None => warn!("Transcript disabled: cannot open {}", path.display()),
        }
    }

    let progress: Box<dyn ProgressNotifier> = if cli.quiet {
        Box::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };

    let response = match use_case
        .execute_with_progress(RunPromptInput::new(session, request), progress.as_ref())
        .await
    {
        Ok(response) => response,
        Err(e) => {
            eprintln!("{}", ConsoleFormatter::format_error(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    if !cli.quiet {
        eprintln!("{}", ConsoleFormatter::format_summary(&response));
    }
    println!("{}", ConsoleFormatter::render(&response, config.output.format));

    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` wins; otherwise the level follows `-v`.
fn env_filter(verbose: u8) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(verbosity_level(verbose))
}

fn verbosity_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    }
}

/// CLI flags sit on top of every file and env layer.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.session.model = model.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.session.timeout_secs = timeout;
    }
    if let Some(system) = &cli.system {
        config.session.system_message = Some(system.clone());
    }
    if let Some(format) = cli.output {
        config.output.format = format.into();
    }
    if let Some(path) = &cli.cli_path {
        config.copilot.cli_path = Some(path.clone());
        config.copilot.cli_url = None;
    }
    if let Some(url) = &cli.cli_url {
        config.copilot.cli_url = Some(url.clone());
    }
    if let Some(path) = &cli.transcript {
        config.output.transcript = Some(path.clone());
    }
}
