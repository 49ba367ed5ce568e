//! Local stand-in for a Verify tenant
//!
//! Issues sequential tokens (`token-1`, `token-2`, ...) and serves a handful of
//! API routes covering the response shapes the gateway has to handle.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use verify_gateway::catalog::{CatalogIndex, parse_table};
use verify_gateway::client::ApiClient;
use verify_gateway::gateway::VerifyMcp;
use verify_gateway::oauth::ClientCredentials;

/// Token endpoint path on the mock tenant
pub const TOKEN_PATH: &str = "/v1.0/endpoint/default/token";

/// Catalog whose endpoints map onto the mock routes
pub const FIXTURE_CATALOG: &str = r"
Users Management v2.0 (SCIM):
  description: SCIM users
  endpoints:
    getUser:
      method: GET
      path: /v2.0/Users/{id}
      description: Get a user by id
      params:
        id:
          type: string
          required: true
          description: User id
    createUser:
      method: POST
      path: /v2.0/Users
      description: Create a user
      body:
        userName:
          type: string
          required: true
          description: Login name
Applications:
  description: Application management
  endpoints:
    listApplications:
      method: GET
      path: /v1.0/applications
      description: List applications
    deleteApplication:
      method: DELETE
      path: /v1.0/applications/{id}
      description: Delete an application
    getApplicationReport:
      method: GET
      path: /v1.0/applications/report
      description: Plain text usage report
    getMissingApplication:
      method: GET
      path: /v1.0/applications/missing
      description: Always not found
Sessions:
  description: Session handling
  endpoints:
    getSessionInfo:
      method: GET
      path: /v1.0/sessions/info
      description: Rejects the first token it sees
    getPortal:
      method: GET
      path: /v1.0/portal
      description: Answers with the interactive login page
";

/// Interactive login page as the tenant serves it
pub const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html><head><script>
var runtime=true;
window.location.href = "/idaas/mtfim/sps/idaas/login?Target=portal";
</script></head><body>Redirecting</body></html>"#;

/// Shared mock state
#[derive(Default)]
pub struct MockState {
    issued: AtomicUsize,
    token_forms: Mutex<Vec<HashMap<String, String>>>,
    revoked_calls: AtomicUsize,
}

impl MockState {
    /// Number of tokens issued so far
    pub fn tokens_issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    /// Requests that reached the always-unauthorized route
    pub fn revoked_calls(&self) -> usize {
        self.revoked_calls.load(Ordering::SeqCst)
    }

    /// Form bodies received by the token endpoint
    pub fn token_forms(&self) -> Vec<HashMap<String, String>> {
        self.token_forms.lock().clone()
    }
}

/// A running mock tenant
pub struct MockTenant {
    /// Base URL, e.g. `http://127.0.0.1:41234`
    pub base_url: String,
    /// Observable state
    pub state: Arc<MockState>,
}

impl MockTenant {
    /// Bind on an ephemeral port and serve in the background
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route(TOKEN_PATH, post(token_handler))
            .route("/v2.0/Users", post(create_user))
            .route("/v2.0/Users/{id}", get(get_user))
            .route("/v1.0/applications", get(list_applications))
            .route("/v1.0/applications/report", get(report))
            .route("/v1.0/applications/missing", get(missing))
            .route("/v1.0/applications/{id}", delete(delete_application))
            .route("/v1.0/sessions/info", get(session_info))
            .route("/v1.0/sessions/revoked", get(revoked))
            .route("/v1.0/portal", get(portal))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Token manager pointed at this tenant
    pub fn credentials(&self) -> Arc<ClientCredentials> {
        Arc::new(ClientCredentials::new(
            reqwest::Client::new(),
            format!("{}{TOKEN_PATH}", self.base_url),
            "client-abc",
            "secret-xyz",
            "openid",
        ))
    }

    /// API client pointed at this tenant
    pub fn api_client(&self) -> ApiClient {
        ApiClient::new(reqwest::Client::new(), self.base_url.clone(), self.credentials())
    }

    /// Meta-MCP handler over the fixture catalog and this tenant
    pub fn mcp(&self) -> VerifyMcp {
        VerifyMcp::new(Arc::new(fixture_index()), Arc::new(self.api_client()))
    }
}

/// Index built from [`FIXTURE_CATALOG`]
pub fn fixture_index() -> CatalogIndex {
    CatalogIndex::build(parse_table(FIXTURE_CATALOG).unwrap())
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn bearer(headers: &HeaderMap) -> String {
    header_str(headers, header::AUTHORIZATION)
        .strip_prefix("Bearer ")
        .unwrap_or_default()
        .to_string()
}

async fn token_handler(
    State(state): State<Arc<MockState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let authorized = form.get("client_secret").is_some_and(|s| s == "secret-xyz");
    state.token_forms.lock().push(form);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"}))).into_response();
    }

    let n = state.issued.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "access_token": format!("token-{n}"),
        "token_type": "Bearer",
        "expires_in": 7200
    }))
    .into_response()
}

async fn get_user(Path(id): Path<String>, headers: HeaderMap, RawQuery(query): RawQuery) -> Response {
    (
        [(header::CONTENT_TYPE, "application/scim+json")],
        Json(json!({
            "id": id,
            "accept": header_str(&headers, header::ACCEPT),
            "content_type": header_str(&headers, header::CONTENT_TYPE),
            "token": bearer(&headers),
            "query": query,
        })),
    )
        .into_response()
}

async fn create_user(headers: HeaderMap, body: Bytes) -> Response {
    let received: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (
        StatusCode::CREATED,
        [(header::CONTENT_TYPE, "application/scim+json")],
        Json(json!({
            "content_type": header_str(&headers, header::CONTENT_TYPE),
            "received": received,
        })),
    )
        .into_response()
}

async fn list_applications(headers: HeaderMap, RawQuery(query): RawQuery) -> Json<Value> {
    Json(json!({
        "accept": header_str(&headers, header::ACCEPT),
        "query": query,
    }))
}

async fn delete_application(Path(_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn report() -> Response {
    ([(header::CONTENT_TYPE, "text/plain")], "3 applications, 2 active").into_response()
}

async fn missing() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"messageId": "CSIAH0001E", "messageDescription": "not found"}))).into_response()
}

async fn session_info(headers: HeaderMap) -> Response {
    let token = bearer(&headers);
    if token == "token-1" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "expired"}))).into_response();
    }
    Json(json!({"token": token})).into_response()
}

async fn revoked(State(state): State<Arc<MockState>>) -> Response {
    state.revoked_calls.fetch_add(1, Ordering::SeqCst);
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "revoked"}))).into_response()
}

async fn portal() -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], LOGIN_PAGE).into_response()
}
