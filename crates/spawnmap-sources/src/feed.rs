//! The message feed: one fetch per refresh cycle.
//!
//! Uses enum dispatch instead of trait objects because async methods are
//! not dyn-compatible.

use spawnmap_core::config::SourceConfig;
use spawnmap_types::RawMessage;
use tracing::warn;

use crate::discord::DiscordFeed;
use crate::error::SourceError;
use crate::replay::ReplayFeed;

/// Where the next batch of messages comes from.
#[derive(Debug)]
pub enum MessageFeed {
    /// Poll the live channel.
    Discord(DiscordFeed),
    /// Serve a captured batch from disk.
    Replay(ReplayFeed),
}

impl MessageFeed {
    /// Fetch the most recent batch.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the batch could not be obtained at all.
    /// Individual malformed messages are skipped, not reported.
    pub async fn fetch_recent(&self) -> Result<Vec<RawMessage>, SourceError> {
        match self {
            Self::Discord(feed) => feed.fetch_recent().await,
            Self::Replay(feed) => Ok(feed.messages().to_vec()),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Discord(_) => "discord",
            Self::Replay(_) => "replay",
        }
    }
}

/// Build the feed described by the `source` config section.
///
/// A configured `replay_file` wins over the live channel.
///
/// # Errors
///
/// Returns [`SourceError`] if the replay file cannot be read or decoded.
pub fn create_feed(config: &SourceConfig, client: reqwest::Client) -> Result<MessageFeed, SourceError> {
    match &config.replay_file {
        Some(path) => Ok(MessageFeed::Replay(ReplayFeed::load(path)?)),
        None => Ok(MessageFeed::Discord(DiscordFeed::new(client, config))),
    }
}

/// Decode a JSON array of messages, one element at a time.
///
/// The payload itself must be an array; elements that do not decode are
/// skipped with a warning so one odd message never costs the whole batch.
pub(crate) fn decode_batch(payload: serde_json::Value, origin: &str) -> Result<Vec<RawMessage>, SourceError> {
    let serde_json::Value::Array(items) = payload else {
        return Err(SourceError::Decode {
            origin: origin.to_owned(),
            message: format!("expected a JSON array of messages, got {}", kind(&payload)),
        });
    };

    let mut messages = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawMessage>(item) {
            Ok(message) => messages.push(message),
            Err(e) => warn!(origin, index, error = %e, "skipping undecodable message"),
        }
    }
    Ok(messages)
}

const fn kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_each_element_independently() {
        let payload = serde_json::json!([
            {"id": "1", "embeds": [{"title": "100% Mewtwo", "description": "q=1.5,2.5"}]},
            {"id": "2", "embeds": "not a list"},
            {"id": "3"}
        ]);
        let messages = decode_batch(payload, "test").unwrap();
        let ids: Vec<_> = messages.iter().filter_map(|m| m.id.as_deref()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn non_array_payload_is_an_error() {
        let payload = serde_json::json!({"message": "401: Unauthorized", "code": 0});
        let err = decode_batch(payload, "https://discord.invalid").unwrap_err();
        assert!(err.to_string().contains("got an object"));
    }

    #[tokio::test]
    async fn replay_feed_serves_its_batch() {
        let feed = MessageFeed::Replay(ReplayFeed::new(vec![RawMessage::with_embed("a", "b")]));
        assert_eq!(feed.name(), "replay");
        assert_eq!(feed.fetch_recent().await.unwrap().len(), 1);
    }
}
