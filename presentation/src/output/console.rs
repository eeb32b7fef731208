//! Console output formatter for responses and diagnostics

use colored::Colorize;
use oneshot_domain::{ConfigIssue, OutputFormat, Response, Severity};

/// Formats responses for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Disable ANSI colors for everything rendered afterwards
    pub fn set_color(enabled: bool) {
        if !enabled {
            colored::control::set_override(false);
        }
    }

    /// Format a response in the requested format
    pub fn render(response: &Response, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => Self::format(response),
            OutputFormat::Json => Self::format_json(response),
        }
    }

    /// Plain response content, trailing whitespace trimmed
    pub fn format(response: &Response) -> String {
        response.content.trim_end().to_string()
    }

    /// Format as JSON
    pub fn format_json(response: &Response) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
    }

    /// One line summary for stderr once the reply is in
    pub fn format_summary(response: &Response) -> String {
        format!(
            "{} {} {}",
            "Model:".dimmed(),
            response.model.yellow(),
            format!("(session {})", response.session_id).dimmed()
        )
    }

    /// A configuration issue, prefixed by its severity
    pub fn format_issue(issue: &ConfigIssue) -> String {
        let label = match issue.severity {
            Severity::Error => "error:".red().bold(),
            Severity::Warning => "warning:".yellow().bold(),
        };
        format!("{} {}", label, issue.message)
    }

    /// A failed run, with its chain of causes
    pub fn format_error(error: &(dyn std::error::Error + 'static)) -> String {
        let mut output = format!("{} {}", "error:".red().bold(), error);
        let mut source = error.source();
        while let Some(cause) = source {
            output.push_str(&format!("\n  {} {}", "caused by:".dimmed(), cause));
            source = cause.source();
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneshot_application::{GatewayError, RunPromptError};
    use oneshot_domain::ConfigIssueCode;

    fn sample() -> Response {
        Response::new("for i in 1..=100 {}\n\n", "s-1", "gpt-4.1").with_message_id("m-1")
    }

    #[test]
    fn test_text_is_content_only() {
        assert_eq!(
            ConsoleFormatter::render(&sample(), OutputFormat::Text),
            "for i in 1..=100 {}"
        );
    }

    #[test]
    fn test_json_carries_all_fields() {
        let rendered = ConsoleFormatter::render(&sample(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["session_id"], "s-1");
        assert_eq!(value["message_id"], "m-1");
        assert_eq!(value["model"], "gpt-4.1");
    }

    #[test]
    fn test_issue_formatting() {
        colored::control::set_override(false);

        let issue = ConfigIssue::warning(ConfigIssueCode::ZeroTimeout, "timeout is 0");
        assert_eq!(ConsoleFormatter::format_issue(&issue), "warning: timeout is 0");
    }

    #[test]
    fn test_run_failure_lists_its_cause() {
        colored::control::set_override(false);

        let error =
            RunPromptError::Cleanup(GatewayError::CleanupFailed("stop refused".to_string()));
        let rendered = ConsoleFormatter::format_error(&error);

        assert_eq!(
            rendered,
            "error: Cleanup failed after a successful exchange: Cleanup failed: stop refused\n  \
             caused by: Cleanup failed: stop refused"
        );

        let timeout =
            RunPromptError::Gateway(GatewayError::Timeout(std::time::Duration::from_secs(60)));
        assert_eq!(
            ConsoleFormatter::format_error(&timeout),
            "error: Timed out after 60s waiting for a response"
        );
    }
}
