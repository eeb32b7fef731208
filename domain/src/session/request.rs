//! Request value object

use crate::core::error::DomainError;
use std::time::Duration;

/// Timeout applied when a request does not carry its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A single prompt to send to a session (Value Object)
///
/// Immutable once built. The timeout bounds how long the caller waits for
/// the complete response; `None` means [`DEFAULT_TIMEOUT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    prompt: String,
    timeout: Option<Duration>,
}

impl Request {
    /// Create a request, rejecting empty or whitespace-only prompts.
    pub fn new(prompt: impl Into<String>) -> Result<Self, DomainError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(DomainError::EmptyPrompt);
        }
        Ok(Self {
            prompt,
            timeout: None,
        })
    }

    /// Set an explicit timeout. A zero duration is allowed and expires
    /// unless the response is already available.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The timeout to enforce, falling back to [`DEFAULT_TIMEOUT`].
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_creation() {
        let request = Request::new("write fizzbuzz").unwrap();
        assert_eq!(request.prompt(), "write fizzbuzz");
        assert_eq!(request.timeout(), None);
        assert_eq!(request.effective_timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_empty_prompt_rejected() {
        assert_eq!(Request::new("").unwrap_err(), DomainError::EmptyPrompt);
        assert_eq!(Request::new(" \n\t").unwrap_err(), DomainError::EmptyPrompt);
    }

    #[test]
    fn test_explicit_timeout() {
        let request = Request::new("hi")
            .unwrap()
            .with_timeout(Duration::from_secs(0));
        assert_eq!(request.effective_timeout(), Duration::ZERO);
    }
}
