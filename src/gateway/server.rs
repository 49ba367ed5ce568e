//! Gateway server

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::auth::ResolvedAuthConfig;
use super::meta_mcp::VerifyMcp;
use super::router::{AppState, create_router};
use crate::catalog::CatalogIndex;
use crate::client::ApiClient;
use crate::config::{Config, TransportKind};
use crate::error::rpc_codes;
use crate::oauth::ClientCredentials;
use crate::protocol::JsonRpcResponse;
use crate::{Error, Result};

/// Verify MCP gateway
pub struct Gateway {
    config: Config,
    mcp: Arc<VerifyMcp>,
}

impl Gateway {
    /// Build the catalog index, credential cache and API client
    pub fn new(config: Config) -> Result<Self> {
        let index = Arc::new(load_index(&config)?);
        info!(
            categories = index.categories().len(),
            endpoints = index.total_endpoints(),
            "Catalog loaded"
        );

        let tokens = Arc::new(ClientCredentials::from_config(&config.tenant)?);
        let client = Arc::new(ApiClient::from_config(&config.tenant, tokens)?);
        let mcp = Arc::new(VerifyMcp::new(index, client));

        Ok(Self { config, mcp })
    }

    /// Run the configured transport until it ends
    pub async fn run(self) -> Result<()> {
        match self.config.server.transport {
            TransportKind::Stdio => {
                info!(tenant = %self.config.tenant.url, "Serving MCP on stdio");
                serve_stdio(&self.mcp, tokio::io::stdin(), tokio::io::stdout()).await
            }
            TransportKind::Http => self.run_http().await,
        }
    }

    async fn run_http(self) -> Result<()> {
        let server = &self.config.server;
        let addr = SocketAddr::new(
            server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            server.port,
        );

        let auth_config = Arc::new(ResolvedAuthConfig::from_config(&self.config.auth));
        let state = Arc::new(AppState {
            mcp: Arc::clone(&self.mcp),
            auth_config,
        });
        let app = create_router(state);

        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("VERIFY GATEWAY v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %server.host, port = %server.port, "Listening");
        info!(tenant = %self.config.tenant.url, "Tenant");
        info!("  POST http://{}:{}/mcp  (requests)", server.host, server.port);
        info!("  GET  http://{}:{}/health", server.host, server.port);

        if self.config.auth.enabled {
            info!(
                "AUTHENTICATION enabled (bearer={}, api_keys={})",
                self.config.auth.bearer_token.is_some(),
                self.config.auth.api_keys.len()
            );
        } else {
            warn!("AUTHENTICATION disabled - gateway is open to all requests");
        }
        info!("============================================================");

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = stop_tx.send(true);
            })
            .into_future();

        let shutdown_timeout = server.shutdown_timeout;
        let drain_deadline = async move {
            // a dropped sender means the server already finished
            if stop_rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(shutdown_timeout).await;
        };

        tokio::select! {
            result = serve => result.map_err(|e| Error::Internal(e.to_string()))?,
            () = drain_deadline => {
                warn!(timeout = ?shutdown_timeout, "In-flight requests did not drain in time");
            }
        }

        info!("Gateway stopped");
        Ok(())
    }
}

fn load_index(config: &Config) -> Result<CatalogIndex> {
    match &config.catalog.path {
        Some(path) => {
            info!(path = %path.display(), "Loading catalog file");
            CatalogIndex::load(path)
        }
        None => CatalogIndex::bundled(),
    }
}

/// Serve newline-delimited JSON-RPC until the reader hits EOF
pub async fn serve_stdio<R, W>(mcp: &VerifyMcp, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(message) => mcp.handle_message(&message).await,
            Err(e) => {
                debug!(error = %e, "Malformed stdio frame");
                Some(JsonRpcResponse::error(
                    None,
                    rpc_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
        };

        if let Some(response) = response {
            let mut frame = serde_json::to_vec(&response)?;
            frame.push(b'\n');
            writer.write_all(&frame).await?;
            writer.flush().await?;
        }
    }

    info!("stdin closed, stopping");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
