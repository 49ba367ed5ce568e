//! Verify meta-MCP handler: the four meta-tools behind JSON-RPC
//!
//! Pure helpers live in [`super::meta_mcp_helpers`]. Both transports feed raw
//! JSON values into [`VerifyMcp::handle_message`].

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::catalog::CatalogIndex;
use crate::client::ApiClient;
use crate::discovery::{DiscoverQuery, DiscoveryService};
use crate::error::rpc_codes;
use crate::invoke::InvocationService;
use crate::outcome::ToolOutcome;
use crate::protocol::{JsonRpcResponse, RequestId, ToolsCallParams, ToolsListResult, negotiate_version};
use crate::{Error, Result};

use super::meta_mcp_helpers::{
    TOOL_DISCOVER, TOOL_EXECUTE, TOOL_GET_API_DETAILS, TOOL_LIST_CATEGORIES,
    build_initialize_result, build_meta_tools, extract_client_version, extract_offset,
    extract_optional_str, extract_required_str, parse_json_argument, parse_params_argument,
    wrap_tool_outcome,
};

/// Meta-MCP handler
pub struct VerifyMcp {
    discovery: DiscoveryService,
    invocation: InvocationService,
}

impl VerifyMcp {
    /// Create a handler over a shared catalog index and API client
    #[must_use]
    pub fn new(index: Arc<CatalogIndex>, client: Arc<ApiClient>) -> Self {
        Self {
            discovery: DiscoveryService::new(Arc::clone(&index)),
            invocation: InvocationService::new(index, client),
        }
    }

    /// Discovery service
    #[must_use]
    pub fn discovery(&self) -> &DiscoveryService {
        &self.discovery
    }

    /// Handle one incoming JSON-RPC message.
    ///
    /// Returns `None` for notifications, which get no reply.
    pub async fn handle_message(&self, message: &Value) -> Option<JsonRpcResponse> {
        let (id, method, params) = match parse_request(message) {
            Ok(parsed) => parsed,
            Err(response) => return Some(response),
        };

        if is_notification_method(&method) {
            debug!(notification = %method, "Handling notification");
            return None;
        }

        // parse_request guarantees an id for non-notifications
        let id = id?;

        debug!(method = %method, id = %id, "JSON-RPC request");

        let response = match method.as_str() {
            "initialize" => Self::handle_initialize(id, params.as_ref()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => Self::handle_tools_list(id),
            "tools/call" => match parse_tools_call(params) {
                Ok(call) => self.handle_tools_call(id, &call.name, call.arguments).await,
                Err(e) => JsonRpcResponse::error(Some(id), e.to_rpc_code(), e.to_string()),
            },
            _ => JsonRpcResponse::error(
                Some(id),
                rpc_codes::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
        };

        Some(response)
    }

    /// Handle initialize request with version negotiation
    pub fn handle_initialize(id: RequestId, params: Option<&Value>) -> JsonRpcResponse {
        let client_version = extract_client_version(params);
        let negotiated_version = negotiate_version(client_version);
        debug!(
            client = ?client_version,
            negotiated = negotiated_version,
            "Protocol version negotiation"
        );

        let result = build_initialize_result(negotiated_version);
        to_response(id, &result)
    }

    /// Handle tools/list request
    pub fn handle_tools_list(id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: build_meta_tools(),
        };
        to_response(id, &result)
    }

    /// Handle tools/call request
    pub async fn handle_tools_call(&self, id: RequestId, tool_name: &str, arguments: Value) -> JsonRpcResponse {
        let arguments = if arguments.is_null() { json!({}) } else { arguments };

        let result = match tool_name {
            TOOL_DISCOVER => self.discover(&arguments),
            TOOL_LIST_CATEGORIES => Ok(self.discovery.list_categories()),
            TOOL_GET_API_DETAILS => self.get_api_details(&arguments),
            TOOL_EXECUTE => self.execute(&arguments).await,
            _ => Err(Error::json_rpc(
                rpc_codes::METHOD_NOT_FOUND,
                format!("Unknown tool: {tool_name}"),
            )),
        };

        match result {
            Ok(outcome) => wrap_tool_outcome(id, &outcome),
            Err(e) => JsonRpcResponse::error(Some(id), e.to_rpc_code(), e.to_string()),
        }
    }

    fn discover(&self, args: &Value) -> Result<ToolOutcome> {
        let request = DiscoverQuery {
            query: extract_required_str(args, "query")?.to_string(),
            category: extract_optional_str(args, "category").map(str::to_string),
            method: extract_optional_str(args, "method").map(str::to_string),
            offset: extract_offset(args)?,
        };
        Ok(self.discovery.discover(&request))
    }

    fn get_api_details(&self, args: &Value) -> Result<ToolOutcome> {
        let endpoint_id = extract_required_str(args, "endpoint_id")?;
        Ok(self.invocation.get_details(endpoint_id))
    }

    async fn execute(&self, args: &Value) -> Result<ToolOutcome> {
        let endpoint_id = extract_required_str(args, "endpoint_id")?;
        let params = parse_params_argument(args)?;
        let body = parse_json_argument(args, "body")?;
        Ok(self.invocation.execute(endpoint_id, &params, body).await)
    }
}

fn to_response<T: serde::Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(Some(id), rpc_codes::INTERNAL_ERROR, e.to_string()),
    }
}

fn parse_tools_call(params: Option<Value>) -> Result<ToolsCallParams> {
    let params = params.ok_or_else(|| Error::json_rpc(rpc_codes::INVALID_PARAMS, "Missing tools/call params"))?;
    serde_json::from_value(params)
        .map_err(|e| Error::json_rpc(rpc_codes::INVALID_PARAMS, format!("Invalid tools/call params: {e}")))
}

/// Extract a `RequestId` from a JSON value.
///
/// Supports string and integer ID values per JSON-RPC 2.0.
fn extract_request_id(value: &Value) -> Option<RequestId> {
    match value {
        Value::String(s) => Some(RequestId::String(s.clone())),
        Value::Number(n) => n.as_i64().map(RequestId::Number),
        _ => None,
    }
}

/// Check whether a method name represents a notification (no response expected).
fn is_notification_method(method: &str) -> bool {
    method.starts_with("notifications/")
}

/// Parse a JSON-RPC request or notification.
///
/// Returns `(id, method, params)`; `id` is `None` for notifications.
#[allow(clippy::result_large_err)]
fn parse_request(value: &Value) -> std::result::Result<(Option<RequestId>, String, Option<Value>), JsonRpcResponse> {
    let id = value.get("id").and_then(extract_request_id);

    if value.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Err(JsonRpcResponse::error(
            id,
            rpc_codes::INVALID_REQUEST,
            "Invalid JSON-RPC version",
        ));
    }

    let method = value
        .get("method")
        .and_then(Value::as_str)
        .ok_or_else(|| JsonRpcResponse::error(id.clone(), rpc_codes::INVALID_REQUEST, "Missing method"))?;

    if !is_notification_method(method) && id.is_none() {
        return Err(JsonRpcResponse::error(None, rpc_codes::INVALID_REQUEST, "Missing id"));
    }

    Ok((id, method.to_string(), value.get("params").cloned()))
}
