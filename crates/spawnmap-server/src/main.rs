//! Spawn map service entry point.
//!
//! Polls a chat channel for spawn announcements, keeps the live set in
//! memory, and serves it on a map page.
//!
//! # Startup Sequence
//!
//! 1. Load `.env`, if present
//! 2. Load configuration from `SPAWNMAP_CONFIG` (default `spawnmap.yaml`)
//! 3. Initialize structured logging (tracing)
//! 4. Build the clock, HTTP client, message feed, and sprite cache
//! 5. Serve until `Ctrl-C`

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use spawnmap_core::config::{LogFormat, LoggingConfig};
use spawnmap_core::{Clock, Extractor, SpawnMapConfig};
use spawnmap_sources::{build_client, create_feed, SpriteCache};
use spawnmap_web::{start_server, AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Config file used when `SPAWNMAP_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "spawnmap.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a collaborator cannot be
/// set up, or the listener fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let config_path = std::env::var_os("SPAWNMAP_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, loaded_from) = load_config(&config_path)?;

    init_logging(&config.logging);
    info!("spawnmap starting");
    info!(
        path = %config_path.display(),
        defaults = loaded_from.is_none(),
        "configuration loaded"
    );

    run(&config).await?;
    Ok(())
}

/// Wire the collaborators together and serve.
async fn run(config: &SpawnMapConfig) -> Result<(), AppError> {
    let clock = Clock::from_config(&config.time)?;
    info!(
        zone = clock.zone().name(),
        pinned = matches!(clock, Clock::Fixed(_)),
        "clock ready"
    );

    let client = build_client(Duration::from_millis(config.source.timeout_ms))?;

    let feed = create_feed(&config.source, client.clone())?;
    info!(
        feed = feed.name(),
        channel = config.source.channel_id,
        limit = config.source.fetch_limit(),
        token = config.source.token.is_some(),
        "message feed configured"
    );

    let sprites = SpriteCache::new(&config.sprites, client);
    sprites.prepare().await?;

    let extractor = Extractor::new()?;
    let state = Arc::new(AppState::new(feed, sprites, extractor, clock, &config.map));

    start_server(&ServerConfig::from(&config.server), state).await?;
    Ok(())
}

/// Load configuration from `path`, or from defaults plus environment
/// overrides when the file does not exist.
///
/// Returns the path actually read, if any.
fn load_config(path: &Path) -> Result<(SpawnMapConfig, Option<PathBuf>), AppError> {
    if path.exists() {
        let config = SpawnMapConfig::from_file(path)?;
        Ok((config, Some(path.to_path_buf())))
    } else {
        Ok((SpawnMapConfig::from_env()?, None))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, loaded_from) = load_config(&dir.path().join("absent.yaml")).unwrap();
        assert!(loaded_from.is_none());
        assert_eq!(config.map.zoom, 14);
    }

    #[test]
    fn existing_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spawnmap.yaml");
        std::fs::write(&path, "map:\n  zoom: 11\nsprites:\n  offline: true\n").unwrap();

        let (config, loaded_from) = load_config(&path).unwrap();
        assert_eq!(loaded_from.as_deref(), Some(path.as_path()));
        assert_eq!(config.map.zoom, 11);
        assert!(config.sprites.offline);
    }

    #[test]
    fn invalid_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spawnmap.yaml");
        std::fs::write(&path, "time:\n  zone: Not/AZone\n").unwrap();

        assert!(matches!(load_config(&path), Err(AppError::Config(_))));
    }
}
