//! Stowage Server Binary
//!
//! Standalone server for the stowage inventory API.

use std::sync::Arc;

use stowage_core::StowageConfig;
use stowage_server::{serve, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = StowageConfig::from_env()?;
    let addr = config.server.addr.clone();
    let state = Arc::new(AppState::open(config)?);

    serve(&addr, state).await
}
