//! JSON-RPC envelopes and the MCP method payloads this server answers

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Content, Info, ServerCapabilities, Tool};

const JSONRPC_VERSION: &str = "2.0";

/// Reply to a request. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`
    pub jsonrpc: String,
    /// Echo of the request id; serialized as `null` when the request was unreadable
    pub id: Option<RequestId>,
    /// Method result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful reply carrying `result`
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Failed reply; `id` is `None` only when the request id could not be read
    pub fn error(id: Option<RequestId>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// `error` member of a failed reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// One of [`crate::error::rpc_codes`]
    pub code: i32,
    /// Human-readable reason
    pub message: String,
}

/// Request id as sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// `"id": "abc"`
    String(String),
    /// `"id": 7`
    Number(i64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// `initialize` result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Negotiated protocol revision
    pub protocol_version: String,
    /// What the server offers
    pub capabilities: ServerCapabilities,
    /// Name and version of this gateway
    pub server_info: Info,
    /// Workflow guidance for the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// `tools/list` result; the four meta-tools always fit on one page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    /// Advertised tools
    pub tools: Vec<Tool>,
}

/// `tools/call` params
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCallParams {
    /// Which meta-tool to run
    pub name: String,
    /// Tool input; absent arguments become `null`
    #[serde(default)]
    pub arguments: Value,
}

/// `tools/call` result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCallResult {
    /// Single JSON text block
    pub content: Vec<Content>,
    /// Set when the tool outcome is a failure
    #[serde(default)]
    pub is_error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_id_accepts_strings_and_numbers() {
        let id: RequestId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(id, RequestId::String("abc".to_string()));
        let id: RequestId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn unreadable_request_error_has_null_id() {
        let value = serde_json::to_value(JsonRpcResponse::error(None, -32700, "Parse error")).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}}));
    }

    #[test]
    fn tool_failure_sets_is_error() {
        let result = ToolsCallResult {
            content: vec![Content::text("{}")],
            is_error: true,
        };
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value, json!({"content": [{"type": "text", "text": "{}"}], "isError": true}));
    }

    #[test]
    fn initialize_result_field_names() {
        let result = InitializeResult {
            protocol_version: "2025-06-18".to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: Info {
                name: "verify-gateway".to_string(),
                version: "0.1.0".to_string(),
                title: None,
            },
            instructions: None,
        };
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["protocolVersion"], "2025-06-18");
        assert_eq!(value["serverInfo"]["name"], "verify-gateway");
        assert!(value.get("instructions").is_none());
    }
}
