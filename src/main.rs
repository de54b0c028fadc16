//! CRUD resource server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request_lifecycle (ingress log, RequestContext)
//!                         │
//!                         ▼
//!                     CORS → body limits → result shaping
//!                         │
//!                         ▼
//!                     classify_errors ◀──────────────┐
//!                         │                          │ AppError
//!                         ▼                          │
//!                     route table ── guarded? ── authorization gate
//!                         │                          │
//!                         ▼                          ▼
//!                     handler group ──▶ persistence / identity / storage
//!                         │
//!     Client Response     ▼
//!     ◀────────────── egress log (once, on body end or disconnect)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use resource_server::config::{load_config, ServerConfig};
use resource_server::http::{AppState, Server};
use resource_server::lifecycle::shutdown_signal;
use resource_server::observability::{logging, metrics};
use resource_server::services::{identity, MemoryStorage, MemoryStore};

#[derive(Parser)]
#[command(name = "resource-server", version, about = "CRUD resource server")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the configuration file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init_tracing(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "resource-server starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        identity: identity::from_config(&config.identity)?,
        storage: Arc::new(MemoryStorage::new()),
    };

    let port = cli.port.unwrap_or(config.server.port);
    let server = Server::standard(config, state)?;
    let listening = server.listen(port).await?;

    listening.run_until(shutdown_signal()).await?;

    tracing::info!("resource-server stopped");
    Ok(())
}
