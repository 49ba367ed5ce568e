//! Authenticated dispatcher for the Verify REST API
//!
//! One [`ApiClient::send`] performs one logical call: bearer header injection,
//! SCIM media-type selection, a single retry after a 401, and response
//! classification via [`response::classify`].

mod response;

pub use response::{
    AUTH_REDIRECT_DETECTED, ApiResponse, MAX_ERROR_BODY, MAX_TEXT_BODY, classify, is_login_page,
};

use std::sync::Arc;

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;
use tracing::{debug, info};

use crate::catalog::HttpMethod;
use crate::config::TenantConfig;
use crate::oauth::TokenSource;
use crate::{Error, Result};

/// Default media type
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Media type required by the identity-management (SCIM) paths
pub const SCIM_MEDIA_TYPE: &str = "application/scim+json";

/// Path prefixes served with [`SCIM_MEDIA_TYPE`]
pub const SCIM_PATH_PREFIXES: [&str; 4] = ["/v2.0/Users", "/v2.0/Groups", "/v2.0/Me", "/v2.0/Bulk"];

/// Whether a resolved path belongs to the SCIM surface
#[must_use]
pub fn is_scim_path(path: &str) -> bool {
    SCIM_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// One call against the remote API, path fully resolved
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Resolved path (no placeholders)
    pub path: String,
    /// Query string pairs; repeated keys are allowed
    pub query: Vec<(String, String)>,
    /// JSON body (ignored for GET)
    pub body: Option<Value>,
    /// Extra headers overriding the defaults
    pub headers: Vec<(String, String)>,
    /// Content type overriding the default
    pub content_type: Option<String>,
}

impl ApiRequest {
    /// Create a request without query, body or header overrides
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            content_type: None,
        }
    }

    /// Set the query string pairs
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Set the JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header overriding the defaults
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Override the content type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// HTTP client bound to one tenant
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Create a client from explicit parts
    #[must_use]
    pub fn new(http_client: Client, base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Create a client for the configured tenant
    pub fn from_config(tenant: &TenantConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(tenant.request_timeout)
            .danger_accept_invalid_certs(!tenant.verify_ssl)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create API HTTP client: {e}")))?;

        Ok(Self::new(http_client, tenant.url.clone(), tokens))
    }

    /// Tenant base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one logical call, retrying once after a 401
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let headers = build_headers(request)?;
        let url = format!("{}{}", self.base_url, request.path);

        debug!(method = %request.method, url = %url, "Dispatching API request");

        let token = self.tokens.token().await?;
        let mut response = self.dispatch(request, &url, &headers, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            info!(path = %request.path, "Got 401, refreshing token and retrying");
            self.tokens.invalidate();
            let token = self.tokens.token().await?;
            response = self.dispatch(request, &url, &headers, &token).await?;
        }

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response body: {e}")))?;

        debug!(status, bytes = body.len(), "API response received");
        classify(status, &content_type, body)
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        url: &str,
        headers: &HeaderMap,
        token: &str,
    ) -> Result<reqwest::Response> {
        let auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::TokenAcquisition("Token is not a valid header value".to_string()))?;

        let mut builder = self
            .http_client
            .request(request.method.to_reqwest(), url)
            .headers(headers.clone())
            .header(AUTHORIZATION, auth);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if request.method != HttpMethod::Get {
            if let Some(ref body) = request.body {
                builder = builder.body(serde_json::to_vec(body)?);
            }
        }

        builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Request failed: {e}")))
    }
}

/// Accept and Content-Type defaults plus caller overrides
fn build_headers(request: &ApiRequest) -> Result<HeaderMap> {
    let media_type = if is_scim_path(&request.path) {
        SCIM_MEDIA_TYPE
    } else {
        JSON_MEDIA_TYPE
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(media_type));

    let content_type = request.content_type.as_deref().unwrap_or(media_type);
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .map_err(|_| Error::Protocol(format!("Invalid content type '{content_type}'")))?,
    );

    for (name, value) in &request.headers {
        let header_name: HeaderName = name
            .parse()
            .map_err(|_| Error::Protocol(format!("Invalid header name '{name}'")))?;
        let header_value: HeaderValue = value
            .parse()
            .map_err(|_| Error::Protocol(format!("Invalid value for header '{name}'")))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}
