//! Mock HTTP server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request          ┌───────────────────────────────────────────────────────┐
//!     ────────────────────────┼─▶ http server ─▶ routing ─▶ response registry         │
//!                             │   (request id,   (method,   (id → pipeline)           │
//!                             │    timeout)       path)          │                    │
//!                             │                                  ▼                    │
//!                             │                        delay (advisory, async sleep)  │
//!                             │                                  │                    │
//!                             │                                  ▼                    │
//!     Client Response         │   content source ─▶ filter[0] ─▶ … ─▶ filter[n-1]     │
//!     ◀───────────────────────┼── (drained once)    (re-run on every request)         │
//!                             │                                                       │
//!                             │   config loader / watcher ─▶ atomic state swap        │
//!                             └───────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use mock_server::config::{load_config, ConfigWatcher, ServerConfig};
use mock_server::lifecycle::Shutdown;
use mock_server::observability::{logging, metrics};
use mock_server::MockServer;

#[derive(Parser, Debug)]
#[command(name = "mock-server")]
#[command(about = "Serve canned HTTP responses defined in a config file", long_about = None)]
struct Cli {
    /// Configuration file (TOML, or JSON with a .json extension).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Do not reload when the config or body files change.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("mock-server v{} starting", env!("CARGO_PKG_VERSION"));
    if cli.config.is_none() {
        tracing::warn!("No config file given, serving no responses");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match (&cli.config, cli.no_watch) {
        (Some(path), false) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let handle = watcher.with_body_files(&config).run()?;
            (Some(handle), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = MockServer::new(config)?;
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
