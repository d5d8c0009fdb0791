//! multiroute server
//!
//! Serves a route tree from a TOML config. Overlapping routes grouped in a
//! `multi` table are tried in order until one of them responds.
//!
//! ```text
//!     Client Request
//!     ──────────▶ http server ──▶ Router ──▶ multiurl ──▶ candidate 1 (declines)
//!                                                    └──▶ candidate 2 (responds)
//!     Client Response ◀──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use multiroute::config::{load_config, AppConfig, ConfigWatcher};
use multiroute::lifecycle::{shutdown_signal, Shutdown};
use multiroute::observability::{logging, metrics};
use multiroute::HttpServer;

#[derive(Parser)]
#[command(name = "multiroute")]
#[command(about = "HTTP server with overlapping routes and fallthrough dispatch", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(Some(&config.observability.log_level));
    tracing::info!("multiroute v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        telemetry = config.resolver.telemetry,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config)?;

    let signals = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signals.trigger();
    });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
