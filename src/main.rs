//! Redirect proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌─────────┐    ┌──────────────┐    ┌──────────────┐
//!     ─────────────────────▶│  http   │───▶│   routing    │───▶│    target    │
//!                           │ server  │    │ table lookup │    │ redirect URL │
//!                           └─────────┘    └──────────────┘    └──────┬───────┘
//!     Client Response       ┌─────────┐                               │
//!     ◀─────────────────────│response │◀──────────────────────────────┘
//!     (3xx + Location)      └─────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use redirect_proxy::config::{load_config, ProxyConfig};
use redirect_proxy::observability::logging;
use redirect_proxy::{HttpServer, Table};

#[derive(Parser)]
#[command(name = "redirect-proxy")]
#[command(about = "HTTP redirect proxy driven by a route table", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability)?;

    tracing::info!("redirect-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        config = ?cli.config,
        "Configuration loaded"
    );

    let table = Table::parse(&config.routing.table)?;
    if table.is_empty() {
        tracing::warn!("Route table is empty, every request will get 404");
    } else {
        tracing::info!(routes = table.routes().len(), "Route table loaded");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let server = HttpServer::new(config, table);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
