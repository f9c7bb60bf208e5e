//! # SSP Connector Main Entry Point
//!
//! This is the main entry point for the SSP Connector service.

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use ssp_connector::{config::ConfigLoader, db, server::run_server, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load().context("loading configuration")?;

    telemetry::init_tracing(&config);

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!("Configuration: {}", redacted_json);
    }

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    Migrator::up(&db, None)
        .await
        .context("applying database migrations")?;

    run_server(config, db)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

    Ok(())
}
