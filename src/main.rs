//! Students API - CRUD Service over SQLite or Postgres
//!
//! Opens the configured storage once, serves the HTTP API, and on
//! SIGINT/SIGTERM drains in-flight requests before closing storage.

use clap::Parser;
use students_api::http::{self, AppState};
use students_api::{storage, Config, APP_VERSION};

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .init();

    tracing::info!("Students API v{} ({})", APP_VERSION, config.env);

    let addrs = config.socket_addrs()?;
    let grace = config.shutdown_grace()?;
    let locator = config.storage_locator()?;

    let storage = storage::connect(&locator).await?;
    tracing::info!("Storage initialized: {}", storage.backend_name());

    let state = AppState::new(storage, config.expose_errors());

    let listener = match tokio::net::TcpListener::bind(addrs.as_slice()).await {
        Ok(listener) => listener,
        Err(e) => {
            state.storage.close().await;
            return Err(anyhow::anyhow!("failed to bind {}: {e}", config.address));
        }
    };

    http::serve(listener, state, grace, http::shutdown_signal()).await?;

    Ok(())
}
