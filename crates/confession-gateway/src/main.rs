//! Confession Gateway Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p confession-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use anyhow::Context;
use confession_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed to start");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        address = %config.gateway.address(),
        store = ?config.store.backend,
        broadcast = ?config.broadcast.backend,
        "Configuration loaded"
    );

    confession_gateway::run(config).await?;

    Ok(())
}
