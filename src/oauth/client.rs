//! Client-credentials token manager
//!
//! Concurrent callers that all find the cache empty may each run an
//! acquisition. Every acquisition installs a complete `(token, expiry)` pair,
//! so whichever write lands last wins and no caller ever sees a torn value.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use super::TokenSource;
use super::token::CachedToken;
use crate::config::TenantConfig;
use crate::{Error, Result};

/// OAuth2 client-credentials grant against the tenant token endpoint
pub struct ClientCredentials {
    /// HTTP client for token requests (short timeout)
    http_client: Client,
    /// Token endpoint URL
    token_url: String,
    /// API client id
    client_id: String,
    /// API client secret
    client_secret: String,
    /// Requested scope
    scope: String,
    /// Current token (cached)
    current_token: RwLock<Option<CachedToken>>,
}

/// OAuth token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default, deserialize_with = "lenient_seconds")]
    expires_in: Option<u64>,
}

/// `expires_in` as tenants actually send it
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSeconds {
    Whole(u64),
    Fractional(f64),
    Text(String),
    Other(#[allow(dead_code)] serde::de::IgnoredAny),
}

/// Accept `3600`, `3600.0` and `"3600"`; anything else falls back to the default lifetime
fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn whole(secs: f64) -> Option<u64> {
        (secs.is_finite() && secs >= 0.0).then(|| secs as u64)
    }

    Ok(match Option::<RawSeconds>::deserialize(deserializer)? {
        Some(RawSeconds::Whole(secs)) => Some(secs),
        Some(RawSeconds::Fractional(secs)) => whole(secs),
        Some(RawSeconds::Text(text)) => text.trim().parse::<f64>().ok().and_then(whole),
        Some(RawSeconds::Other(_)) | None => None,
    })
}

impl ClientCredentials {
    /// Create a token manager from explicit parts
    #[must_use]
    pub fn new(
        http_client: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
            current_token: RwLock::new(None),
        }
    }

    /// Create a token manager for the configured tenant
    pub fn from_config(tenant: &TenantConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(tenant.token_timeout)
            .danger_accept_invalid_certs(!tenant.verify_ssl)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create token HTTP client: {e}")))?;

        Ok(Self::new(
            http_client,
            tenant.token_url(),
            tenant.client_id.clone(),
            tenant.resolve_client_secret(),
            tenant.scope.clone(),
        ))
    }

    /// Check if a valid token is cached
    pub fn has_valid_token(&self) -> bool {
        self.current_token
            .read()
            .as_ref()
            .is_some_and(CachedToken::is_valid)
    }

    /// Request a new token and install it in the cache
    async fn acquire(&self) -> Result<String> {
        info!(token_url = %self.token_url, "Requesting OAuth2 token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::TokenAcquisition(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenAcquisition(format!(
                "Token endpoint returned HTTP {status}: {}",
                body.chars().take(500).collect::<String>()
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::TokenAcquisition(format!("Failed to parse token response: {e}")))?;

        let token = CachedToken::from_response(token_response.access_token, token_response.expires_in);
        info!(expires_in = ?token_response.expires_in, "OAuth2 token acquired");

        let access_token = token.access_token.clone();
        *self.current_token.write() = Some(token);
        Ok(access_token)
    }
}

#[async_trait]
impl TokenSource for ClientCredentials {
    async fn token(&self) -> Result<String> {
        {
            let token = self.current_token.read();
            if let Some(ref t) = *token {
                if t.is_valid() {
                    return Ok(t.access_token.clone());
                }
            }
        }

        debug!("No valid cached token");
        self.acquire().await
    }

    fn invalidate(&self) {
        debug!("Invalidating cached token");
        *self.current_token.write() = None;
    }
}
