//! Asset Gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────────┐
//!                    │                      ASSET GATEWAY                       │
//!                    │                                                          │
//!   Client Request   │  ┌──────────┐   ┌────────────┐  claimed  ┌────────────┐  │
//!   ─────────────────┼─▶│   net    │──▶│ asset gate │──────────▶│ key/locate │  │
//!                    │  │listeners │   │ (by port)  │           └─────┬──────┘  │
//!                    │  └──────────┘   └─────┬──────┘        hit ┌────┴───┐miss │
//!                    │                       │ passed            ▼        ▼     │
//!                    │                       ▼            ┌─────────┐ ┌───────┐ │
//!                    │              ┌────────────────┐    │ encrypt │ │ fetch │◀┼── Provider
//!                    │              │ analytics/ping │    │  gate   │ │ + tee │ │
//!                    │              └────────────────┘    └─────────┘ └───┬───┘ │
//!                    │                                                    ▼     │
//!                    │                                            assets-cache/ │
//!                    └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use asset_gateway::config::{load_config, GatewayConfig};
use asset_gateway::lifecycle::{termination_signal, Shutdown};
use asset_gateway::net::bind_all;
use asset_gateway::observability::{logging, metrics};
use asset_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "asset-gateway")]
#[command(about = "Serves game assets from disk, falling back to an upstream provider", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the default configuration and exit.
    #[arg(long)]
    print_default: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.print_default {
        println!("{}", toml::to_string_pretty(&GatewayConfig::default())?);
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_tracing(&config.observability);

    tracing::info!("asset-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        mode = ?config.asset_server.mode,
        asset_port = config.asset_server.port,
        use_cache = config.asset_server.use_cache,
        provider_url = %config.asset_server.provider_url,
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

    let server = HttpServer::new(config.clone())?;
    let listeners = bind_all(&config.listener).await?;

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    shutdown.trigger_on(termination_signal());
    server.run(listeners, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
