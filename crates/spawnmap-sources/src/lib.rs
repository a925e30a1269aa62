//! External collaborators of the spawn map: where messages come from and
//! where sprite images come from.
//!
//! # Architecture
//!
//! ```text
//! channel API --> DiscordFeed --\
//!                                >-- MessageFeed --> registry refresh
//! capture file --> ReplayFeed --/
//!
//! species --> SpriteCache --(miss)--> catalog API --> artwork --> disk
//! ```
//!
//! Both collaborators are best-effort. A failed poll is an error the caller
//! logs and treats as an empty batch; a failed sprite lookup is never an
//! error at all, it degrades to the configured fallback image.

pub mod discord;
pub mod error;
pub mod feed;
pub mod replay;
pub mod sprites;

use std::time::Duration;

pub use discord::DiscordFeed;
pub use error::SourceError;
pub use feed::{create_feed, MessageFeed};
pub use replay::ReplayFeed;
pub use sprites::SpriteCache;

/// User agent sent on every outbound request.
const USER_AGENT: &str = concat!("spawnmap/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the feed and the sprite cache.
///
/// # Errors
///
/// Returns [`SourceError::Client`] if the TLS backend cannot be
/// initialised.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Client(e.to_string()))
}
