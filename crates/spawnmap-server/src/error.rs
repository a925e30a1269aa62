//! Start-up errors for the spawn map binary.
//!
//! Every variant is fatal: once the server is listening, nothing on the
//! request path returns an error.

use spawnmap_core::{ClockError, ConfigError};
use spawnmap_sources::SourceError;
use spawnmap_web::ServerError;

/// Errors that can stop the service from starting or keep it from serving.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The configuration file or an override is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The time zone or pinned clock is invalid.
    #[error("clock error: {0}")]
    Clock(#[from] ClockError),

    /// The HTTP client, replay file, or sprite directory could not be set up.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// An announcement pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// The listener could not bind or the server failed.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}
