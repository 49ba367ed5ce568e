//! Verify Gateway - MCP server for the IBM Security Verify REST API
//!
//! Four meta-tools front the whole Verify API surface.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use verify_gateway::{
    catalog::CatalogIndex,
    cli::{CatalogCommand, Cli, Command},
    config::{self, Config},
    discovery::{DiscoverQuery, DiscoveryService},
    gateway::Gateway,
    invoke,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    // before parsing, so clap's env fallbacks see VERIFY_TENANT and friends
    let project_env = env::current_dir()
        .ok()
        .and_then(|dir| config::load_project_env(&dir));
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }
    if let Some(path) = project_env {
        info!(path = %path.display(), "Loaded project .env");
    }

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // env_files may have exported variables the flags fall back to
    let cli = if config.env_files.is_empty() { cli } else { Cli::parse() };
    cli.apply_overrides(&mut config);

    match cli.command {
        Some(Command::Catalog(cmd)) => run_catalog_command(&config, cmd),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

/// Run offline catalog commands; no tenant credentials needed
fn run_catalog_command(config: &Config, cmd: CatalogCommand) -> ExitCode {
    let index = match &config.catalog.path {
        Some(path) => CatalogIndex::load(path),
        None => CatalogIndex::bundled(),
    };
    let index = match index {
        Ok(index) => Arc::new(index),
        Err(e) => {
            eprintln!("❌ Failed to load catalog: {e}");
            return ExitCode::FAILURE;
        }
    };
    let discovery = DiscoveryService::new(index);

    let outcome = match cmd {
        CatalogCommand::Categories => discovery.list_categories(),
        CatalogCommand::Search {
            query,
            category,
            method,
            offset,
        } => discovery.discover(&DiscoverQuery {
            query,
            category,
            method,
            offset,
        }),
        CatalogCommand::Show { endpoint_id } => invoke::details(discovery.index(), &endpoint_id),
    };

    println!("{}", outcome.render());
    if outcome.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run_server(config: Config) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        tenant = %config.tenant.url,
        transport = ?config.server.transport,
        "Starting Verify gateway"
    );

    let gateway = match Gateway::new(config) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}
