//! Gateway settings: YAML file, `VERIFY_GATEWAY_*` environment, then CLI flags

use std::{env, fmt, path::Path, path::PathBuf, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Root of the settings tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before resolving `env:` references.
    /// `.env` files applied before anything else; `~` is expanded and later files win.
    pub env_files: Vec<String>,
    /// Verify tenant connection
    pub tenant: TenantConfig,
    /// Listener and transport
    pub server: ServerConfig,
    /// Endpoint catalog source
    pub catalog: CatalogConfig,
    /// Client authentication for the HTTP transport
    pub auth: AuthConfig,
}

impl Config {
    /// Merge defaults, the optional YAML file and `VERIFY_GATEWAY_*` variables
    ///
    /// # Errors
    ///
    /// Fails when an explicitly given file is missing or any layer is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("VERIFY_GATEWAY_").split("__"));

        // env files must be exported before the environment layer is read
        let env_files: Vec<String> = figment.extract_inner("env_files").unwrap_or_default();
        export_env_files(&env_files);

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.tenant.url = config.tenant.url.trim_end_matches('/').to_string();

        Ok(config)
    }

    /// Export the `env_files` entries into the process environment.
    /// Files that don't exist are skipped.
    pub fn load_env_files(&self) {
        export_env_files(&self.env_files);
    }

    /// Check that everything needed to talk to the tenant is present
    pub fn validate(&self) -> Result<()> {
        if self.tenant.url.is_empty() {
            return Err(Error::Config(
                "Tenant URL is not set (VERIFY_TENANT or tenant.url)".to_string(),
            ));
        }
        url::Url::parse(&self.tenant.url)
            .map_err(|e| Error::Config(format!("Invalid tenant URL '{}': {e}", self.tenant.url)))?;
        if self.tenant.client_id.is_empty() {
            return Err(Error::Config(
                "API client id is not set (API_CLIENT_ID or tenant.client_id)".to_string(),
            ));
        }
        if self.tenant.resolve_client_secret().is_empty() {
            return Err(Error::Config(
                "API client secret is not set (API_CLIENT_SECRET or tenant.client_secret)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn expand_home(path_str: &str) -> String {
    if path_str.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path_str.replacen('~', &home.display().to_string(), 1);
        }
    }
    path_str.to_string()
}

/// Resolve `env:VAR_NAME` references, falling back to the literal value
fn resolve_env_ref(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix("env:") {
        env::var(var_name).unwrap_or_default()
    } else {
        value.to_string()
    }
}

/// Verify tenant connection settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    /// Tenant base URL (e.g. `https://acme.verify.ibm.com`)
    pub url: String,
    /// API client id
    pub client_id: String,
    /// API client secret (literal or `env:VAR_NAME`)
    pub client_secret: String,
    /// Verify TLS certificates
    pub verify_ssl: bool,
    /// Scope requested with the client-credentials grant
    pub scope: String,
    /// Token endpoint path relative to the tenant URL
    pub token_path: String,
    /// Per-request timeout for API calls
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Timeout for the token request
    #[serde(with = "humantime_serde")]
    pub token_timeout: Duration,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            verify_ssl: true,
            scope: "openid".to_string(),
            token_path: "/v1.0/endpoint/default/token".to_string(),
            request_timeout: Duration::from_secs(120),
            token_timeout: Duration::from_secs(30),
        }
    }
}

impl TenantConfig {
    /// OAuth2 token endpoint
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}{}", self.url, self.token_path)
    }

    /// Client secret with `env:` references expanded
    #[must_use]
    pub fn resolve_client_secret(&self) -> String {
        resolve_env_ref(&self.client_secret)
    }
}

impl fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .field("scope", &self.scope)
            .field("token_path", &self.token_path)
            .field("request_timeout", &self.request_timeout)
            .field("token_timeout", &self.token_timeout)
            .finish()
    }
}

/// Transport the MCP server listens on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Newline-delimited JSON-RPC on stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP (`POST /mcp`); `sse` is accepted as a legacy name
    #[serde(alias = "sse")]
    #[value(alias = "sse")]
    Http,
}

/// How MCP clients reach the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// stdio or http
    pub transport: TransportKind,
    /// Host to bind to (http transport)
    pub host: String,
    /// Port to listen on (http transport)
    pub port: u16,
    /// Upper bound on draining in-flight HTTP requests after a signal
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Stdio,
            host: "127.0.0.1".to_string(),
            port: 8004,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Endpoint catalog source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// YAML catalog replacing the bundled one
    pub path: Option<PathBuf>,
}

/// Client authentication for the HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Require a bearer token on non-public paths
    pub enabled: bool,
    /// Shared bearer token (literal or `env:VAR_NAME`)
    pub bearer_token: Option<String>,
    /// Named API keys
    pub api_keys: Vec<ApiKeyConfig>,
    /// Paths that bypass authentication
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bearer_token: None,
            api_keys: Vec::new(),
            public_paths: vec!["/health".to_string()],
        }
    }
}

impl AuthConfig {
    /// Resolve the bearer token (expand `env:` references)
    #[must_use]
    pub fn resolve_bearer_token(&self) -> Option<String> {
        self.bearer_token
            .as_deref()
            .map(resolve_env_ref)
            .filter(|t| !t.is_empty())
    }
}

/// Named API key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    /// The key value (literal or `env:VAR_NAME`)
    pub key: String,
    /// Human-readable client name
    #[serde(default)]
    pub name: String,
}

impl ApiKeyConfig {
    /// Resolve the key (expand `env:` references)
    #[must_use]
    pub fn resolve_key(&self) -> String {
        resolve_env_ref(&self.key)
    }
}

/// Load the nearest `.env`, searching `start` and then its parents.
///
/// Variables already present in the environment keep their values. Returns
/// the file that was loaded.
pub fn load_project_env(start: &Path) -> Option<PathBuf> {
    let path = start
        .ancestors()
        .map(|dir| dir.join(".env"))
        .find(|candidate| candidate.is_file())?;
    dotenvy::from_path(&path).ok()?;
    Some(path)
}

fn export_env_files(paths: &[String]) {
    for path_str in paths {
        let expanded = expand_home(path_str);
        let path = Path::new(&expanded);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
            }
        } else {
            tracing::debug!("Skipping missing env file {expanded}");
        }
    }
}

/// Serde helpers for human-readable durations
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to a human-readable string (e.g., "30s")
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    /// Deserialize a duration string (e.g., "30s", "5m", "100ms") or bare seconds
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Secs(u64),
            Text(String),
        }

        let s = match Raw::deserialize(deserializer)? {
            Raw::Secs(secs) => return Ok(Duration::from_secs(secs)),
            Raw::Text(s) => s,
        };

        // "ms" must be checked before "s"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(serde::de::Error::custom)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(serde::de::Error::custom)
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        }
    }
}
