//! JSON-RPC protocol types for Copilot CLI communication.
//!
//! This module defines the message structures used in the JSON-RPC 2.0 protocol
//! for communicating with the Copilot CLI process.
//!
//! # Protocol Overview
//!
//! - **Requests**: Client → Copilot CLI (`ping`, `session.create`, `session.send`, `session.destroy`)
//! - **Responses**: Copilot CLI → Client (result or error)
//! - **Notifications**: Copilot CLI → Client (`session.event` carrying `assistant.message`, `session.idle`, ...)
//! - **Incoming requests**: Copilot CLI → Client (`tool.call`, `permission.request`), answered with
//!   [`JsonRpcErrorOut`] since no handlers are registered

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Protocol version this client speaks (checked against `ping`).
pub const SUPPORTED_PROTOCOL_VERSION: u64 = 2;

/// JSON-RPC error code for "method not found".
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Global request ID counter for JSON-RPC requests.
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Generates a unique request ID.
fn next_id() -> u64 {
    REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Creates a new JSON-RPC request with an auto-generated ID.
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: next_id(),
            method: method.into(),
            params,
        }
    }

    /// Creates a request whose params are a serialized struct.
    pub fn with_params<T: Serialize>(
        method: impl Into<String>,
        params: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self::new(method, Some(serde_json::to_value(params)?)))
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    pub id: Option<u64>,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Notification from server (`session.event`, etc.)
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

/// JSON-RPC error response sent from client → CLI for incoming requests
/// this client does not handle.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorOut {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub error: RpcError,
}

impl JsonRpcErrorOut {
    pub fn method_not_found(id: u64, method: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error: RpcError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not supported by client: {}", method),
                data: None,
            },
        }
    }
}

/// `ping` parameters
#[derive(Debug, Clone, Serialize)]
pub struct PingParams {
    pub message: String,
}

/// `ping` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResult {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub protocol_version: Option<u64>,
}

/// Session creation parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<SystemMessageConfig>,
}

/// System message appended to the service's own instructions.
#[derive(Debug, Clone, Serialize)]
pub struct SystemMessageConfig {
    pub mode: &'static str,
    pub content: String,
}

impl SystemMessageConfig {
    pub fn append(content: impl Into<String>) -> Self {
        Self {
            mode: "append",
            content: content.into(),
        }
    }
}

/// Session creation result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResult {
    pub session_id: String,
}

/// Send parameters (for `session.send`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    pub session_id: String,
    pub prompt: String,
}

/// Send result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub message_id: Option<String>,
}

/// Destroy parameters (for `session.destroy`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroySessionParams {
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique() {
        let a = JsonRpcRequest::new("ping", None);
        let b = JsonRpcRequest::new("ping", None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn request_without_params_omits_field() {
        let json = serde_json::to_value(JsonRpcRequest::new("ping", None)).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert!(json.get("params").is_none());
    }

    #[test]
    fn create_session_params_serialize_camel_case() {
        let params = CreateSessionParams {
            model: Some("gpt-4.1".to_string()),
            system_message: Some(SystemMessageConfig::append("Be brief")),
        };

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["model"], "gpt-4.1");
        assert_eq!(json["systemMessage"]["mode"], "append");
        assert_eq!(json["systemMessage"]["content"], "Be brief");
    }

    #[test]
    fn create_session_params_without_system_message_omits_field() {
        let params = CreateSessionParams {
            model: Some("gpt-4.1".to_string()),
            system_message: None,
        };

        let json = serde_json::to_value(&params).unwrap();
        assert!(json.get("systemMessage").is_none());
    }

    #[test]
    fn ping_result_tolerates_missing_version() {
        let result: PingResult = serde_json::from_value(serde_json::json!({"message": "pong"})).unwrap();
        assert_eq!(result.message, "pong");
        assert!(result.protocol_version.is_none());

        let result: PingResult =
            serde_json::from_value(serde_json::json!({"message": "pong", "protocolVersion": 2}))
                .unwrap();
        assert_eq!(result.protocol_version, Some(SUPPORTED_PROTOCOL_VERSION));
    }

    #[test]
    fn error_out_serializes_method_not_found() {
        let json = serde_json::to_value(JsonRpcErrorOut::method_not_found(7, "tool.call")).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["error"]["code"], METHOD_NOT_FOUND);
        assert!(json.get("result").is_none());
    }
}
