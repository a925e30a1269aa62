//! Error types for the external collaborators.

use std::path::PathBuf;

/// Errors from polling the channel or filling the sprite cache.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// No channel token is configured.
    #[error("DISCORD_TOKEN is not set")]
    MissingToken,

    /// The request never produced a response.
    #[error("request to {url} failed: {message}")]
    Request {
        /// Target URL.
        url: String,
        /// Transport error text.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for the log.
        body: String,
    },

    /// The response body was not the expected shape.
    #[error("unexpected response from {origin}: {message}")]
    Decode {
        /// URL or file the payload came from.
        origin: String,
        /// What was wrong with it.
        message: String,
    },

    /// Reading or writing a local file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
