//! Error types for the Verify gateway

use std::io;

use thiserror::Error;

/// Result type alias for the Verify gateway
pub type Result<T> = std::result::Result<T, Error>;

/// Verify gateway errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog file could not be read or parsed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// OAuth2 token acquisition failed
    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(String),

    /// Remote API answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    RemoteStatus {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Transport error (connect, timeout, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed request or an answer the gateway cannot interpret
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Failure that maps onto a specific JSON-RPC code
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// One of [`rpc_codes`]
        code: i32,
        /// Reason reported to the client
        message: String,
    },

    /// Reading config, catalog or stdio failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Request or response JSON did not parse
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bug or runtime setup failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Error reported to the client with `code`
    pub fn json_rpc(code: i32, message: impl Into<String>) -> Self {
        Self::JsonRpc {
            code,
            message: message.into(),
        }
    }

    /// JSON-RPC code used when this error ends a request
    #[must_use]
    pub fn to_rpc_code(&self) -> i32 {
        match self {
            Self::JsonRpc { code, .. } => *code,
            Self::Json(_) => rpc_codes::PARSE_ERROR,
            Self::Protocol(_) => rpc_codes::INVALID_REQUEST,
            Self::TokenAcquisition(_)
            | Self::RemoteStatus { .. }
            | Self::Transport(_) => rpc_codes::SERVER_ERROR_START,
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }
}

/// JSON-RPC 2.0 error codes
pub mod rpc_codes {
    /// Body is not JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// JSON but not a request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Unknown method or tool
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Bad `tools/call` arguments
    pub const INVALID_PARAMS: i32 = -32602;
    /// Gateway fault
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Tenant, token or client-auth failure
    pub const SERVER_ERROR_START: i32 = -32000;
}
