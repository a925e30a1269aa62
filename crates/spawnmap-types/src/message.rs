//! Serde DTOs for chat messages as returned by the channel API.
//!
//! Only the fields the extractor reads are modelled. Unknown fields are
//! ignored, and missing or `null` fields decode to empty values so a sparse
//! message never fails to decode.

use serde::{Deserialize, Serialize};

/// One chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Message snowflake, when present.
    #[serde(default)]
    pub id: Option<String>,
    /// Rich-content blocks attached to the message.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub embeds: Vec<Embed>,
}

impl RawMessage {
    /// Build a message carrying a single embed.
    pub fn with_embed(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            embeds: vec![Embed {
                title: Some(title.into()),
                description: Some(description.into()),
            }],
        }
    }

    /// The first embed, the only one the extractor looks at.
    pub fn first_embed(&self) -> Option<&Embed> {
        self.embeds.first()
    }
}

/// A rich-content block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Embed title.
    #[serde(default)]
    pub title: Option<String>,
    /// Embed body text.
    #[serde(default)]
    pub description: Option<String>,
}

impl Embed {
    /// Title, or the empty string when absent.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Description, or the empty string when absent.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Embed>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Embed>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_discord_shape() {
        let raw = r#"{
            "id": "1234",
            "timestamp": "2025-06-01T18:00:00.000000+00:00",
            "content": "",
            "embeds": [
                {"title": "100% Mewtwo", "description": "End: 11:59:59 PM", "color": 1},
                {"title": "ignored"}
            ]
        }"#;
        let msg: RawMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.id.as_deref(), Some("1234"));
        assert_eq!(msg.embeds.len(), 2);
        let embed = msg.first_embed().unwrap();
        assert_eq!(embed.title(), "100% Mewtwo");
        assert_eq!(embed.description(), "End: 11:59:59 PM");
    }

    #[test]
    fn missing_and_null_fields_are_empty() {
        let msg: RawMessage = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert!(msg.first_embed().is_none());

        let msg: RawMessage = serde_json::from_str(r#"{"embeds": null}"#).unwrap();
        assert!(msg.embeds.is_empty());

        let msg: RawMessage =
            serde_json::from_str(r#"{"embeds": [{"title": null}]}"#).unwrap();
        let embed = msg.first_embed().unwrap();
        assert_eq!(embed.title(), "");
        assert_eq!(embed.description(), "");
    }
}
