//! Oblivious HTTP relay.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                   OHTTP RELAY                    │
//!                        │                                                  │
//!   Client (via proxy)   │  ┌──────────┐   ┌──────────┐   ┌─────────────┐   │
//!   ─────────────────────┼─▶│   net    │──▶│   http   │──▶│  framing +  │   │
//!                        │  │ listener │   │  front   │   │  routing    │   │
//!                        │  └──────────┘   └──────────┘   └──────┬──────┘   │
//!                        │                                       ▼          │
//!                        │                               ┌─────────────┐    │
//!                        │                               │ forwarding  │    │
//!                        │                               │   engine    │    │
//!                        │                               └──────┬──────┘    │
//!                        │                                       ▼          │
//!   Client Response      │                               ┌─────────────┐    │
//!   ◀────────────────────┼───────────────────────────────│  gateway    │◀───┼──── Gateway
//!                        │                               │ pool+client │    │
//!                        │                               └─────────────┘    │
//!                        │  config · observability · resilience · lifecycle │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use ohttp_relay::config::{default_config, load_config};
use ohttp_relay::lifecycle::signals::spawn_signal_handler;
use ohttp_relay::lifecycle::{Relay, Shutdown};
use ohttp_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "ohttp-relay")]
#[command(about = "Oblivious HTTP relay", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "OHTTP_RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    logging::init_logging(&config.observability);
    tracing::info!("ohttp-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        gateways = config.gateways.len(),
        path_prefix = %config.routing.path_prefix,
        max_inflight = config.listener.max_inflight,
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

    let relay = Relay::build(config)?;
    let listener = relay.bind().await?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    relay.serve(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
