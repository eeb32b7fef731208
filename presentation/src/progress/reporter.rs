//! Progress reporting for a single prompt run

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use oneshot_application::ProgressNotifier;
use oneshot_domain::{Model, Response};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// Reports progress with a spinner on stderr
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn slot(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.spinner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_message(&self, message: String) {
        if let Some(pb) = self.slot().as_ref() {
            pb.set_message(message);
        }
    }

    fn finish(&self, message: String) {
        if let Some(pb) = self.slot().take() {
            pb.finish_with_message(message);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_connecting(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message("Connecting to Copilot CLI...");
        pb.enable_steady_tick(TICK);
        *self.slot() = Some(pb);
    }

    fn on_session_created(&self, session_id: &str, model: &Model) {
        self.set_message(format!(
            "Session {} ({})",
            session_id.dimmed(),
            model.to_string().cyan()
        ));
    }

    fn on_waiting(&self, timeout: Duration) {
        self.set_message(format!(
            "Waiting for response {}",
            format!("(timeout {}s)", timeout.as_secs()).dimmed()
        ));
    }

    fn on_response(&self, response: &Response) {
        self.finish(format!("{} Response from {}", "v".green(), response.model));
    }

    fn on_failure(&self, error: &str) {
        self.finish(format!("{} {}", "x".red(), error));
    }

    fn on_finished(&self) {
        if let Some(pb) = self.slot().take() {
            pb.finish_and_clear();
        }
    }
}

/// Simple text-based progress for non-interactive stderr
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_connecting(&self) {
        eprintln!("{} Connecting to Copilot CLI", "->".cyan());
    }

    fn on_session_created(&self, session_id: &str, model: &Model) {
        eprintln!("{} Session {} ({})", "->".cyan(), session_id, model);
    }

    fn on_waiting(&self, timeout: Duration) {
        eprintln!(
            "{} Waiting for response (timeout {}s)",
            "->".cyan(),
            timeout.as_secs()
        );
    }

    fn on_response(&self, response: &Response) {
        eprintln!("  {} {}", "v".green(), response.model);
    }

    fn on_failure(&self, error: &str) {
        eprintln!("  {} {}", "x".red(), error);
    }
}
