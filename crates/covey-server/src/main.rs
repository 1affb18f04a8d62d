//! Covey session server.
//!
//! Wires configuration, logging, the session writer, the enrichment
//! scheduler, and the observer API together, then runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `covey-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Build the conversation-area layout (fails on malformed areas)
//! 4. Spawn the session writer
//! 5. Create the music catalog client and enrichment scheduler
//! 6. Start the observer API server
//! 7. Wait for `Ctrl-C`, then close the session

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use covey_core::config::{CoveyConfig, LogFormat, LoggingConfig};
use covey_core::{Enricher, RefreshScheduler, SessionState, spawn_session};
use covey_enrichment::{SpotifyClient, SpotifyConfig};
use covey_observer::server::ServerConfig;
use covey_observer::state::AppState;
use covey_world::AreaLayout;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

const DEFAULT_CONFIG_PATH: &str = "covey-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("covey-server starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        town = config.town.name,
        areas = config.areas.len(),
        enrichment = config.enrichment.enabled,
        host = config.server.host,
        port = config.server.port,
        "Configuration summary"
    );

    // 3. Build the area layout.
    let layout = Arc::new(AreaLayout::new(&config.areas).map_err(AppError::from)?);
    for area in layout.iter() {
        let bbox = area.bounding_box();
        info!(
            area = %area.id(),
            x = bbox.x,
            y = bbox.y,
            width = bbox.width,
            height = bbox.height,
            "Conversation area registered"
        );
    }

    // 4. Spawn the session writer.
    let (session, writer) = spawn_session(
        SessionState::new(Arc::clone(&layout)),
        config.town.command_buffer,
    );
    info!(command_buffer = config.town.command_buffer, "Session writer spawned");

    // 5. Enrichment.
    let mut scheduler_task = None;
    let enricher = if config.enrichment.enabled {
        let client = SpotifyClient::new(&SpotifyConfig {
            api_url: config.enrichment.api_url.clone(),
            request_timeout: config.enrichment.request_timeout(),
        })
        .map_err(|e| AppError::Catalog {
            message: format!("{e}"),
        })?;
        let enricher = Arc::new(Enricher::new(
            session.clone(),
            client,
            config.enrichment.fetch_timeout(),
        ));
        scheduler_task = Some(
            RefreshScheduler::new(
                Arc::clone(&enricher),
                config.enrichment.refresh_interval(),
                config.enrichment.max_concurrent_refreshes,
            )
            .spawn(),
        );
        info!(
            api_url = config.enrichment.api_url,
            fetch_timeout_ms = config.enrichment.fetch_timeout_ms,
            refresh_interval_ms = config.enrichment.refresh_interval_ms,
            "Enrichment scheduler started"
        );
        Some(enricher)
    } else {
        info!("Enrichment disabled");
        None
    };

    // 6. Start the observer API.
    let app_state = Arc::new(AppState::new(
        session.clone(),
        enricher,
        config.town.name.clone(),
    ));
    let observer = covey_observer::spawn_observer(&ServerConfig::from(&config.server), app_state)
        .await
        .map_err(AppError::from)?;
    info!(addr = %observer.local_addr, "Observer API server started");

    // 7. Run until interrupted.
    tokio::signal::ctrl_c().await.map_err(|e| AppError::Signal {
        message: format!("{e}"),
    })?;
    info!("Shutdown requested");

    if let Some(task) = scheduler_task {
        task.abort();
    }
    observer.task.abort();
    session.close().await;
    if writer.await.is_err() {
        tracing::warn!("session writer task panicked");
    }

    info!("covey-server shutdown complete");
    Ok(())
}

/// Load configuration, falling back to defaults when the file is missing.
///
/// Returns the configuration and whether it came from the file.
fn load_config(path: &Path) -> Result<(CoveyConfig, bool), AppError> {
    if path.exists() {
        Ok((CoveyConfig::from_file(path)?, true))
    } else {
        let mut config = CoveyConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}
