//! stowaway server entry point.
//!
//! Boots one worker version from configuration and exposes its events over
//! the MCP stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
use stowaway_client::{ClientRegistry, Event, FetchClient, FetchConfig, Worker, WorkerState};
use stowaway_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        app = %config.app_name,
        version = %config.version,
        origin = %config.origin,
        "Starting stowaway worker on stdio transport"
    );

    let caches = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let worker = Arc::new(Worker::new(config, caches, network, ClientRegistry::new()).await?);

    if worker.config().install_on_start && worker.state().await != WorkerState::Active {
        if let Err(e) = worker.dispatch(Event::Install).await {
            tracing::error!("install on start failed: {}", e);
        }
    }

    let handler = handler::StowawayServer::new(Arc::clone(&worker));
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;
    worker.settle().await;

    Ok(())
}
