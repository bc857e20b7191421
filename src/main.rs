use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use windowgate::config::WindowgateConfig;
use windowgate::http::HttpServer;
use windowgate::ratelimit::{spawn_eviction, WindowLimiter};

/// Per-client rolling window rate limiter.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init();
    }

    info!("Starting Windowgate Rate Limiting Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = WindowgateConfig::load(args.config.as_deref())?;
    let limit = config.limit()?;
    let addr = config.server.addr();
    info!(
        addr = %addr,
        quota = limit.quota(),
        window_secs = limit.window_secs(),
        "Configuration loaded"
    );

    // Initialize the rate limiter
    let limiter = Arc::new(WindowLimiter::new(limit));
    let sweeper = spawn_eviction(Arc::clone(&limiter), &config.eviction);

    // Run the server with graceful shutdown on Ctrl+C
    let result = HttpServer::new(addr, limiter)
        .serve_with_shutdown(shutdown_signal())
        .await;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    result?;

    info!("Windowgate Rate Limiting Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
