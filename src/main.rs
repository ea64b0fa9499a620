//! MCP question-answering server entry point.
//!
//! Initializes logging, reads configuration from the environment, and runs
//! the HTTP server until shutdown.
//!
//! Environment variables:
//! - HOST: bind address (default: "0.0.0.0")
//! - PORT: listener port (default: 8080)
//! - WORKER_THREADS: HTTP worker count (default: CPU count, capped at 16)
//! - RUST_LOG: log filter (default: "info")

mod core;
mod tools;

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::core::config::ServerConfig;
use crate::core::server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();

    // A bind failure is the only fatal error; everything else surfaces as
    // an HTTP status.
    if let Err(e) = server::run_server_http(config).await {
        error!("Error starting server: {e}");
        return Err(e);
    }
    Ok(())
}
