//! Warden server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `warden-config.yaml` (or `WARDEN_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Validate configuration and build shared state
//! 4. Serve the editor API until `Ctrl-C`

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use warden_server::{AppState, WardenConfig, start_server};

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is unusable or the server cannot
/// bind or serve.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so report the source after init.
    let (config, source) = WardenConfig::load()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("warden-server starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    // 3. Validate and assemble state.
    config.validate()?;
    let server_config = config.server.clone();
    info!(
        logs_dir = %config.paths.logs_dir.display(),
        data_dir = %config.paths.data_dir.display(),
        changelog = %config.paths.changelog.display(),
        extension = config.logs.extension,
        "Paths configured"
    );
    let state = Arc::new(AppState::from_config(config)?);

    // 4. Serve.
    start_server(&server_config, state).await?;

    info!("warden-server shutdown complete");
    Ok(())
}
