//! Response value object

use serde::{Deserialize, Serialize};

/// The completed reply to a [`Request`](super::request::Request).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Final assistant text.
    pub content: String,
    /// Session that produced the reply.
    pub session_id: String,
    /// Message id assigned by the service to the prompt, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Model identifier the session was created with.
    pub model: String,
}

impl Response {
    pub fn new(
        content: impl Into<String>,
        session_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            session_id: session_id.into(),
            message_id: None,
            model: model.into(),
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Whether the reply carries any non-whitespace text.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_content() {
        assert!(Response::new("fn main() {}", "s1", "gpt-4.1").has_content());
        assert!(!Response::new("  \n", "s1", "gpt-4.1").has_content());
    }

    #[test]
    fn test_json_omits_missing_message_id() {
        let json = serde_json::to_value(Response::new("hi", "s1", "gpt-4.1")).unwrap();
        assert!(json.get("message_id").is_none());

        let response = Response::new("hi", "s1", "gpt-4.1").with_message_id("m1");
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["message_id"], "m1");
    }
}
