//! Client authentication for the HTTP transport
//!
//! Callers present `Authorization: Bearer <token>` where the token is either the
//! shared gateway token or one of the named client keys. Paths listed as public
//! (by default `/health`) skip the check.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::error::rpc_codes;

const MISSING_CREDENTIALS: &str = "Missing Authorization header. Use: Authorization: Bearer <token>";
const INVALID_CREDENTIALS: &str = "Invalid token";

/// Auth settings with `env:` references expanded
#[derive(Debug)]
pub struct ResolvedAuthConfig {
    /// Enforce authentication
    pub enabled: bool,
    /// Shared gateway token
    pub bearer_token: Option<String>,
    /// Named client keys
    pub client_keys: Vec<ClientKey>,
    /// Path prefixes that skip authentication
    pub public_paths: Vec<String>,
}

/// A named client key
#[derive(Debug, Clone)]
pub struct ClientKey {
    /// Client name reported in logs
    pub name: String,
    /// Secret presented as the bearer token
    pub secret: String,
}

/// Identity attached to each request that passed the middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedClient {
    /// `bearer`, a client key name, `public` or `anonymous`
    pub name: String,
}

impl AuthenticatedClient {
    fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ResolvedAuthConfig {
    /// Expand the configured secrets; keys that resolve empty are dropped
    pub fn from_config(config: &AuthConfig) -> Self {
        let client_keys = config
            .api_keys
            .iter()
            .filter_map(|k| {
                let secret = k.resolve_key();
                if secret.is_empty() {
                    warn!(client = %k.name, "API key resolved to an empty value, ignoring it");
                    return None;
                }
                let name = if k.name.is_empty() { "api-key".to_string() } else { k.name.clone() };
                Some(ClientKey { name, secret })
            })
            .collect();

        Self {
            enabled: config.enabled,
            bearer_token: config.resolve_bearer_token(),
            client_keys,
            public_paths: config.public_paths.clone(),
        }
    }

    /// Whether `path` starts with one of the public prefixes
    #[must_use]
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Match a presented token against the gateway token and client keys
    #[must_use]
    pub fn validate_token(&self, token: &str) -> Option<AuthenticatedClient> {
        let shared = self
            .bearer_token
            .as_deref()
            .is_some_and(|expected| secrets_match(token, expected));
        if shared {
            return Some(AuthenticatedClient::named("bearer"));
        }

        self.client_keys
            .iter()
            .find(|key| secrets_match(token, &key.secret))
            .map(|key| AuthenticatedClient::named(key.name.as_str()))
    }

    /// Decide whether a request to `path` carrying `headers` may proceed.
    ///
    /// The error is the message returned to the caller.
    pub fn authorize(&self, path: &str, headers: &HeaderMap) -> Result<AuthenticatedClient, &'static str> {
        if !self.enabled {
            return Ok(AuthenticatedClient::named("anonymous"));
        }
        if self.is_public_path(path) {
            return Ok(AuthenticatedClient::named("public"));
        }

        let token = presented_token(headers).ok_or(MISSING_CREDENTIALS)?;
        self.validate_token(token).ok_or(INVALID_CREDENTIALS)
    }
}

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
}

fn secrets_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Axum middleware enforcing [`ResolvedAuthConfig::authorize`]
pub async fn auth_middleware(
    State(auth): State<Arc<ResolvedAuthConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match auth.authorize(&path, request.headers()) {
        Ok(client) => {
            debug!(client = %client.name, path = %path, "Request authorized");
            request.extensions_mut().insert(client);
            next.run(request).await
        }
        Err(reason) => {
            warn!(path = %path, reason, "Rejected unauthenticated request");
            reject(reason)
        }
    }
}

/// 401 with a JSON-RPC error body
fn reject(message: &str) -> Response {
    let body = json!({
        "jsonrpc": "2.0",
        "id": null,
        "error": {"code": rpc_codes::SERVER_ERROR_START, "message": message},
    });
    (StatusCode::UNAUTHORIZED, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response()
}
