//! Restyle proxy server.
//!
//! ```text
//!   client ──POST /fetch──▶ handlers ──▶ FetchGateway ──GET──▶ origin
//!                              │
//!                              ▼
//!                     DocumentTransformer
//!                (resources, colors, text, patch)
//!                              │
//!   client ◀──JSON {content}───┘
//!
//!   client ──GET /proxy-resource?url=──▶ FetchGateway ──▶ (CSS? recolor) ──▶ bytes
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use restyle_proxy::config::{load_config, validation::validate_config, RestyleConfig};
use restyle_proxy::observability::{logging, metrics};
use restyle_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "restyle-proxy")]
#[command(about = "Fetch pages, proxy their assets and recolor them", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RestyleConfig::default(),
    };
    if let Some(port) = cli.port {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{host}:{port}");
    }
    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        fetch_timeout_secs = config.fetch.timeout_secs,
        "restyle-proxy starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Web proxy server listening");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
