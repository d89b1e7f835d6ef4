//! # Similar Products Server
//!
//! Serves `GET /product/:id/similar` and `GET /health` on the configured
//! bind address until Ctrl-C or SIGTERM.

use anyhow::Context;
use clap::Parser;
use similar_products::bootstrap::SimilarProductsSystem;
use similar_products::config::ConfigManager;
use similar_products::logging;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "similar-products-server")]
#[command(about = "Aggregates similar product details from the upstream catalog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration directory (default: ./config)
    #[arg(short, long, env = "SIMILAR_PRODUCTS_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load (default: detected from SIMILAR_PRODUCTS_ENV / APP_ENV)
    #[arg(short, long)]
    environment: Option<String>,

    /// Override server.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_structured_logging();

    let environment = cli
        .environment
        .unwrap_or_else(ConfigManager::detect_environment);
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir, &environment)
        .context("Failed to load configuration")?;
    let config = manager.config();

    let system =
        SimilarProductsSystem::from_config(config).context("Failed to bootstrap service")?;
    let router = system.router(manager.environment());

    let bind_address = cli
        .bind
        .unwrap_or_else(|| config.server.bind_address.clone());
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    info!(
        address = %listener.local_addr().context("Listener has no local address")?,
        environment = %manager.environment(),
        upstream = %config.upstream.base_url,
        "Similar products server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!(
        circuit_breaker = %system.circuit_breaker.metrics().format_summary(),
        "Similar products server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
