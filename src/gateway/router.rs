//! Streamable-HTTP surface: `POST /mcp` for JSON-RPC and `GET /health`

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::debug;

use super::auth::{AuthenticatedClient, ResolvedAuthConfig, auth_middleware};
use super::meta_mcp::VerifyMcp;
use crate::error::rpc_codes;
use crate::protocol::JsonRpcResponse;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// State shared by every HTTP handler
pub struct AppState {
    /// Tool dispatcher
    pub mcp: Arc<VerifyMcp>,
    /// Client credentials checked by the auth layer
    pub auth_config: Arc<ResolvedAuthConfig>,
}

/// Routes wrapped in client auth, panic recovery and request tracing
pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_config = Arc::clone(&state.auth_config);

    Router::new()
        .route("/health", get(health_handler))
        .route("/mcp", post(mcp_handler))
        .layer(middleware::from_fn_with_state(auth_config, auth_middleware))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness plus the size of the loaded catalog
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": state.mcp.discovery().index().total_endpoints()
    }))
}

/// One JSON-RPC message per POST; notifications are acknowledged with 202
async fn mcp_handler(State(state): State<Arc<AppState>>, http_request: Request<Body>) -> Response {
    let caller = http_request
        .extensions()
        .get::<AuthenticatedClient>()
        .map_or_else(String::new, |c| c.name.clone());

    let body_bytes = match axum::body::to_bytes(http_request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => return parse_error_response(&format!("Failed to read body: {e}")),
    };

    let request: Value = match serde_json::from_slice(&body_bytes) {
        Ok(v) => v,
        Err(e) => return parse_error_response(&format!("Invalid JSON: {e}")),
    };

    debug!(client = %caller, "Dispatching JSON-RPC message");

    match state.mcp.handle_message(&request).await {
        Some(response) => Json(response).into_response(),
        None => (StatusCode::ACCEPTED, Json(json!({}))).into_response(),
    }
}

fn parse_error_response(message: &str) -> Response {
    let reply = JsonRpcResponse::error(None, rpc_codes::PARSE_ERROR, message);
    (StatusCode::BAD_REQUEST, Json(reply)).into_response()
}
