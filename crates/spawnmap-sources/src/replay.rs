//! A feed that serves a captured batch from disk.
//!
//! The file holds exactly what the channel API returns: a JSON array of
//! message objects. Paired with a pinned clock (`time.now`) it reproduces a
//! past refresh cycle offline.

use std::path::Path;

use spawnmap_types::RawMessage;
use tracing::info;

use crate::error::SourceError;
use crate::feed::decode_batch;

/// A fixed batch of messages.
#[derive(Debug, Clone, Default)]
pub struct ReplayFeed {
    messages: Vec<RawMessage>,
}

impl ReplayFeed {
    /// Serve `messages` on every fetch.
    pub const fn new(messages: Vec<RawMessage>) -> Self {
        Self { messages }
    }

    /// Load a captured batch.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be read and
    /// [`SourceError::Decode`] if it is not a JSON array.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let origin = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let payload: serde_json::Value =
            serde_json::from_str(&contents).map_err(|e| SourceError::Decode {
                origin: origin.clone(),
                message: e.to_string(),
            })?;
        let messages = decode_batch(payload, &origin)?;
        info!(path = %origin, count = messages.len(), "replay batch loaded");
        Ok(Self { messages })
    }

    /// The batch.
    pub fn messages(&self) -> &[RawMessage] {
        &self.messages
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_a_captured_batch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "9", "embeds": [{{"title": "100% Mewtwo", "description": "End: 1:00:00 PM"}}]}}]"#
        )
        .unwrap();

        let feed = ReplayFeed::load(file.path()).unwrap();
        assert_eq!(feed.messages().len(), 1);
        assert_eq!(
            feed.messages().first().and_then(|m| m.first_embed()).map(|e| e.title()),
            Some("100% Mewtwo")
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ReplayFeed::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[test]
    fn invalid_json_is_decode_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ReplayFeed::load(file.path()),
            Err(SourceError::Decode { .. })
        ));
    }
}
