//! Pure helper functions for the Verify meta-tools, extracted for testability.
//!
//! These are stateless functions with no async or network dependencies.

use serde_json::{Map, Value, json};

use crate::error::rpc_codes;
use crate::outcome::ToolOutcome;
use crate::protocol::{
    Content, Info, InitializeResult, JsonRpcResponse, RequestId, ServerCapabilities, Tool,
    ToolAnnotations, ToolsCallResult, ToolsCapability,
};
use crate::{Error, Result};

/// Discover tool
pub const TOOL_DISCOVER: &str = "verify_discover";
/// List categories tool
pub const TOOL_LIST_CATEGORIES: &str = "verify_list_categories";
/// Endpoint details tool
pub const TOOL_GET_API_DETAILS: &str = "verify_get_api_details";
/// Execute tool
pub const TOOL_EXECUTE: &str = "verify_execute";

const INSTRUCTIONS: &str = "IBM Security Verify API access through four meta-tools:\n\
     - verify_discover: search endpoints by keyword, optionally filtered by category or HTTP method\n\
     - verify_list_categories: browse all API categories grouped by domain\n\
     - verify_get_api_details: full parameter and body schema for one endpoint_id\n\
     - verify_execute: call any endpoint; path parameters like {id} are taken from params\n\
     \n\
     Workflow: discover -> get_api_details -> execute.";

/// Extract the client protocol version from initialize params.
pub(crate) fn extract_client_version(params: Option<&Value>) -> Option<&str> {
    params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
}

/// Build the `InitializeResult` for a given negotiated protocol version.
pub(crate) fn build_initialize_result(negotiated_version: &str) -> InitializeResult {
    InitializeResult {
        protocol_version: negotiated_version.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: false,
            }),
        },
        server_info: Info {
            name: "verify-gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("IBM Security Verify".to_string()),
        },
        instructions: Some(INSTRUCTIONS.to_string()),
    }
}

fn read_only() -> Option<ToolAnnotations> {
    Some(ToolAnnotations {
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        open_world_hint: Some(false),
    })
}

/// Build the four meta-tool definitions.
pub(crate) fn build_meta_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: TOOL_DISCOVER.to_string(),
            title: Some("Discover Verify Endpoints".to_string()),
            description: Some(
                "Search IBM Security Verify API endpoints by keyword, category, or HTTP method. \
                 Use this FIRST to find the endpoint_id before calling verify_get_api_details \
                 or verify_execute. Three or fewer matches include the full schema."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Keyword matched against endpoint ids, paths and descriptions (e.g. \"user\", \"mfa\", \"consent\")"
                    },
                    "category": {
                        "type": "string",
                        "description": "Optional category filter, substring match (e.g. \"FIDO2\", \"Users Management\")"
                    },
                    "method": {
                        "type": "string",
                        "enum": ["GET", "POST", "PUT", "PATCH", "DELETE"],
                        "description": "Optional HTTP method filter"
                    },
                    "offset": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Pagination offset (use next_offset from a previous page)"
                    }
                },
                "required": ["query"]
            }),
            annotations: read_only(),
        },
        Tool {
            name: TOOL_LIST_CATEGORIES.to_string(),
            title: Some("List Verify Categories".to_string()),
            description: Some(
                "List all IBM Security Verify API categories with endpoint counts, grouped by domain."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            annotations: read_only(),
        },
        Tool {
            name: TOOL_GET_API_DETAILS.to_string(),
            title: Some("Get Verify Endpoint Details".to_string()),
            description: Some(
                "Get the full parameter schema, body fields and required fields for one endpoint. \
                 Call this after verify_discover and before verify_execute."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "endpoint_id": {
                        "type": "string",
                        "description": "Endpoint identifier (e.g. \"getUsers\", \"createUser\")"
                    }
                },
                "required": ["endpoint_id"]
            }),
            annotations: read_only(),
        },
        Tool {
            name: TOOL_EXECUTE.to_string(),
            title: Some("Execute Verify Endpoint".to_string()),
            description: Some(
                "Execute any IBM Security Verify API endpoint. Path parameters such as {id} are \
                 substituted from params; remaining params become the query string. \
                 Check verify_get_api_details first for required fields."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "endpoint_id": {
                        "type": "string",
                        "description": "Endpoint identifier to execute"
                    },
                    "params": {
                        "type": "object",
                        "description": "Path and query parameters as key-value pairs"
                    },
                    "body": {
                        "description": "JSON request body for POST, PUT and PATCH"
                    }
                },
                "required": ["endpoint_id"]
            }),
            annotations: Some(ToolAnnotations {
                read_only_hint: Some(false),
                destructive_hint: Some(true),
                open_world_hint: Some(true),
            }),
        },
    ]
}

/// Extract a required string parameter from JSON arguments.
pub(crate) fn extract_required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::json_rpc(rpc_codes::INVALID_PARAMS, format!("Missing '{key}' parameter")))
}

/// Extract an optional, non-empty string parameter.
pub(crate) fn extract_optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Extract the pagination offset, defaulting to 0.
///
/// Accepts integers and numeric strings.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn extract_offset(args: &Value) -> Result<usize> {
    match args.get("offset") {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize).ok_or_else(|| {
            Error::json_rpc(rpc_codes::INVALID_PARAMS, "Invalid 'offset': expected a non-negative integer")
        }),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| {
            Error::json_rpc(rpc_codes::INVALID_PARAMS, "Invalid 'offset': expected a non-negative integer")
        }),
        Some(_) => Err(Error::json_rpc(
            rpc_codes::INVALID_PARAMS,
            "Invalid 'offset': expected a non-negative integer",
        )),
    }
}

/// Decode an argument that may arrive as JSON or as a JSON-encoded string.
///
/// Missing, `null` and empty-string values become `None`.
pub(crate) fn parse_json_argument(args: &Value, key: &str) -> Result<Option<Value>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => serde_json::from_str(raw).map(Some).map_err(|e| {
            Error::json_rpc(rpc_codes::INVALID_PARAMS, format!("Invalid '{key}' JSON string: {e}"))
        }),
        Some(other) => Ok(Some(other.clone())),
    }
}

/// Decode the `params` argument of `verify_execute` into an object.
pub(crate) fn parse_params_argument(args: &Value) -> Result<Map<String, Value>> {
    match parse_json_argument(args, "params")? {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(Error::json_rpc(
            rpc_codes::INVALID_PARAMS,
            "Invalid 'params': expected object or JSON object string",
        )),
    }
}

/// Wrap a tool outcome into a `tools/call` response.
///
/// The text is pretty-printed and capped by the response size ceiling;
/// failures set `isError`.
pub(crate) fn wrap_tool_outcome(id: RequestId, outcome: &ToolOutcome) -> JsonRpcResponse {
    let result = ToolsCallResult {
        content: vec![Content::text(outcome.render())],
        is_error: outcome.is_error(),
    };
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(Some(id), rpc_codes::INTERNAL_ERROR, e.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================
