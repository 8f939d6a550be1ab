//! Local development server for the echo API.
//!
//! ```text
//! echo-api [--config api.toml] [--bind 127.0.0.1:5000]
//!
//!   load config (file → env overrides → flags → validation)
//!       → tracing subscriber, optional Prometheus exporter
//!       → ApiService (routes + structured logger)
//!       → HttpServer on the bound listener
//!       → Ctrl+C / SIGTERM → Shutdown broadcast → graceful drain
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use echo_api::config::load_config_with;
use echo_api::health::ProcessStart;
use echo_api::lifecycle::{wait_for_signal, Shutdown};
use echo_api::observability::{logging, metrics, StructuredLogger};
use echo_api::{ApiService, HttpServer};

#[derive(Parser)]
#[command(name = "echo-api")]
#[command(about = "Minimal HTTP API with request monitoring", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = ProcessStart::now();
    let args = Args::parse();

    let config = load_config_with(args.config.as_deref(), |config| {
        if let Some(bind) = args.bind {
            config.listener.bind_address = bind;
        }
    })?;

    logging::init_tracing(&config.logging);

    tracing::info!(
        service = %config.service.name,
        version = %config.service.version,
        environment = %config.service.environment,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
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

    let logger = Arc::new(StructuredLogger::from_config(&config.service, &config.logging));
    let service = Arc::new(ApiService::from_config(&config, start, logger));
    let server = HttpServer::new(&config, service);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on(wait_for_signal());

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
