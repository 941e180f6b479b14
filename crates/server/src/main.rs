//! lumina-sw server entry point.
//!
//! Boots the offline cache worker and serves it as an MCP server on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use lumina_client::{FetchClient, FetchConfig, ServiceWorker};
use lumina_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
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
    tracing::info!(cache = %config.cache_name(), origin = %config.origin, "Starting lumina-sw on stdio transport");

    let store = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(FetchClient::new(FetchConfig::from_app(&config)?)?);
    let worker = Arc::new(ServiceWorker::new(config, store, network)?);

    // A failed install leaves the worker redundant; requests then pass through.
    match worker.on_install().await {
        Ok(()) if worker.ready_to_activate().await => {
            if let Err(e) = worker.on_activate().await {
                tracing::error!(error = %e, "activation failed");
            }
        }
        Ok(()) => {}
        Err(e) => tracing::error!(error = %e, "install failed"),
    }

    let handler = handler::LuminaServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
