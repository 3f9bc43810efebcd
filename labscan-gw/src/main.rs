//! labscan-gw - Scan Gateway service
//!
//! Accepts barcode input from scan clients, debounces it, validates accepted
//! barcodes against the upstream location resolver, and streams scan outcomes
//! to connected UIs over SSE.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labscan_common::config::Config;
use labscan_common::events::EventBus;
use labscan_gw::services::{HttpResolver, ScanTimings};
use labscan_gw::AppState;

/// Command-line arguments for labscan-gw
#[derive(Parser, Debug)]
#[command(name = "labscan-gw")]
#[command(about = "Scan gateway for laboratory storage barcodes")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "LABSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind
    #[arg(long, env = "LABSCAN_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LABSCAN_PORT")]
    port: Option<u16>,

    /// Base URL of the upstream location resolver
    #[arg(long, env = "LABSCAN_RESOLVER_URL")]
    resolver_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "labscan_gw=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    // CLI and environment override the config file
    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let resolver_url = args.resolver_url.unwrap_or(config.resolver.base_url);
    let timings = ScanTimings::from(&config.scan);

    info!("Starting labscan-gw (Scan Gateway)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Resolver: {}", resolver_url);

    let resolver = HttpResolver::new(
        &resolver_url,
        Duration::from_secs(config.resolver.timeout_seconds),
    )
    .context("Failed to create resolver client")?;

    // Create event bus for SSE broadcasting
    let event_bus = EventBus::new(1000);

    // Create application state and router
    let state = AppState::new(event_bus, Arc::new(resolver), timings);
    let app = labscan_gw::build_router(state);

    let bind_addr = format!("{}:{}", host, port);
    info!("Starting HTTP server on {}", bind_addr);
    info!("Health check: http://{}/api/health", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
