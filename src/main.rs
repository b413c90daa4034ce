//! autowork-proxy
//!
//! Transparent reverse proxy in front of a single upstream origin.
//!
//! ```text
//!     Client ──▶ listener ──▶ server ──▶ director ──▶ upstream
//!                                                       │
//!     Client ◀── server ◀── rewriter (special path) ◀───┘
//! ```
//!
//! Startup failures (bad config, invalid upstream, port in use) end the
//! process with an error. Everything after that is per-exchange.

use std::path::PathBuf;

use clap::Parser;

use autowork_proxy::config;
use autowork_proxy::lifecycle::{signals, Shutdown};
use autowork_proxy::observability::{logging, metrics};
use autowork_proxy::{net, HttpServer};

#[derive(Parser)]
#[command(name = "autowork-proxy")]
#[command(about = "Reverse proxy that forces autoWork to 1 in device info responses", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::loader::default_config()?,
    };

    logging::init(&config.observability);

    tracing::info!("autowork-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_file = ?cli.config,
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        special_path = %config.rewrite.special_path,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = net::bind(&config.listener).await.map_err(|e| {
        tracing::error!(error = %e, "Cannot start listener");
        e
    })?;

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
