//! iotgwd - IoT Gateway Registry Daemon
//!
//! Serves the gateway/device REST API over an in-memory store.
//!
//! Usage:
//!   iotgwd [OPTIONS]
//!
//! Configuration comes from an optional TOML file (`--config`); flags and
//! their `IOTGW_*` environment variables override file values.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use iotgw_api::{create_router, AppState};
use iotgw_core::{seed_store, Fixtures, MemoryStore};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LoggingConfig, Overrides};

#[derive(Parser, Debug)]
#[command(name = "iotgwd")]
#[command(author, version, about = "IoT gateway registry daemon")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "IOTGW_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "IOTGW_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "IOTGW_PORT")]
    port: Option<u16>,

    /// Mount POST /api/testing/reset
    #[arg(long, env = "IOTGW_TESTING_ROUTES")]
    testing_routes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };
    let config = file_config.merge(Overrides {
        host: args.host,
        port: args.port,
        testing_routes: args.testing_routes,
    });

    init_logging(&config.logging);
    tracing::info!("Starting iotgwd (IoT Gateway Registry Daemon)");
    if let Some(path) = &args.config {
        tracing::info!("Loaded config from: {}", path.display());
    }

    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &config.seed.path {
        seed_from_file(&store, path).await?;
    }

    let state = AppState::new(store).with_testing_routes(config.api.testing_routes);
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured filter.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let (json, text) = if logging.json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

async fn seed_from_file(store: &MemoryStore, path: &Path) -> Result<()> {
    tracing::info!("Seeding store from: {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixtures: {}", path.display()))?;
    let fixtures = Fixtures::from_json(&content)
        .with_context(|| format!("Failed to parse fixtures: {}", path.display()))?;
    seed_store(store, fixtures)
        .await
        .with_context(|| format!("Invalid fixtures: {}", path.display()))?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
