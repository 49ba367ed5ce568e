//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, builder::BoolishValueParser};

use crate::config::{Config, TransportKind};

/// IBM Security Verify MCP gateway - four meta-tools over the Verify REST API
#[derive(Parser, Debug)]
#[command(name = "verify-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "VERIFY_GATEWAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Tenant base URL (e.g. <https://acme.verify.ibm.com>)
    #[arg(long, env = "VERIFY_TENANT", global = true)]
    pub tenant: Option<String>,

    /// API client id
    #[arg(long, env = "API_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// API client secret
    #[arg(long, env = "API_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Verify tenant TLS certificates (true/false)
    #[arg(long, env = "VERIFY_SSL", global = true, value_parser = BoolishValueParser::new())]
    pub verify_ssl: Option<bool>,

    /// MCP transport
    #[arg(long, env = "MCP_TRANSPORT", value_enum)]
    pub transport: Option<TransportKind>,

    /// Port to listen on (http transport)
    #[arg(short, long, env = "MCP_PORT")]
    pub port: Option<u16>,

    /// Host to bind to (http transport)
    #[arg(long, env = "MCP_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref tenant) = self.tenant {
            config.tenant.url = tenant.trim_end_matches('/').to_string();
        }
        if let Some(ref client_id) = self.client_id {
            config.tenant.client_id.clone_from(client_id);
        }
        if let Some(ref client_secret) = self.client_secret {
            config.tenant.client_secret.clone_from(client_secret);
        }
        if let Some(verify_ssl) = self.verify_ssl {
            config.tenant.verify_ssl = verify_ssl;
        }
        if let Some(transport) = self.transport {
            config.server.transport = transport;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host.clone_from(host);
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the MCP server (default)
    Serve,

    /// Browse the endpoint catalog offline
    #[command(subcommand)]
    Catalog(CatalogCommand),
}

/// Catalog subcommands
#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Category counts grouped by domain
    Categories,

    /// Ranked endpoint search
    Search {
        /// Search text
        query: String,

        /// Restrict to one category
        #[arg(long)]
        category: Option<String>,

        /// Restrict to one HTTP method
        #[arg(long)]
        method: Option<String>,

        /// Skip this many matches
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Full details of one endpoint
    Show {
        /// Endpoint identifier
        endpoint_id: String,
    },
}
