//! Verify Gateway Library
//!
//! Model Context Protocol (MCP) server for the IBM Security Verify REST API.
//!
//! # Features
//!
//! - **Four meta-tools**: discover, list categories, endpoint details, execute
//! - **Curated catalog**: ~200 Verify endpoints bundled as YAML, searchable by relevance
//! - **OAuth2 client credentials**: cached tenant token with one retry on 401
//! - **Multi-Transport**: stdio and HTTP (`POST /mcp`)
//!
//! # Protocol Version
//!
//! Negotiates MCP protocol versions 2024-11-05 through 2025-11-25.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod gateway;
pub mod invoke;
pub mod oauth;
pub mod outcome;
pub mod protocol;
pub mod ranking;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging on stderr; stdout belongs to the stdio transport
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
    .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}
