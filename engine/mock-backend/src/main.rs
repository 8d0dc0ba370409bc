//! Mock backend server
//!
//! Loads configuration, initializes logging and serves the REST API until
//! Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use mock_backend::logging::initialize_logging;
use mock_backend::{create_routes, AppState, BackendConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mock-backend", version, about = "Mock home energy backend")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "MOCK_BACKEND_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config =
        BackendConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    config.validate().context("Invalid configuration")?;

    initialize_logging(&config.logging)?;
    info!("Starting mock backend v{}", mock_backend::VERSION);

    let state = Arc::new(AppState::from_config(&config).context("Failed to create upstream clients")?);
    let routes = create_routes(state, &config.cors);

    let addr = config.server_addr()?;
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        "Serving on http://{} (electricity region '{}', {}h horizon)",
        bound, config.electricity.region, config.electricity.horizon_hours
    );
    server.await;

    info!("Mock backend shutdown complete");
    Ok(())
}
