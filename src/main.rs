//! # wa-relay
//!
//! Entry point: loads the configuration, sets up logfire and runs the web server.

use wa_relay::{config::AppConfig, logger, server};

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    // Fails before binding when the environment is incomplete
    let app_config = AppConfig::load()?;

    // Initialize logging and metrics
    let shutdown_handler = logger::setup_logfire(&app_config)?;

    server::run_server(app_config).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}
