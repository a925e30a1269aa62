//! Polling the announcement channel over HTTP.
//!
//! One `GET {api_base}/channels/{channel}/messages?limit={n}` per refresh,
//! authenticated with the raw token in the `Authorization` header. Anything
//! other than a 2xx response carrying a JSON array is an error; the caller
//! decides what an error means (for the web surface: an empty batch).

use reqwest::header::AUTHORIZATION;
use spawnmap_core::config::{SecretToken, SourceConfig};
use spawnmap_types::RawMessage;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::feed::decode_batch;

/// Most of an error body kept for the log.
const ERROR_BODY_LIMIT: usize = 512;

/// Client for one channel's recent messages.
#[derive(Debug, Clone)]
pub struct DiscordFeed {
    client: reqwest::Client,
    url: String,
    limit: u8,
    token: Option<SecretToken>,
}

impl DiscordFeed {
    /// Create a feed for the channel described by `config`.
    pub fn new(client: reqwest::Client, config: &SourceConfig) -> Self {
        let url = format!(
            "{}/channels/{}/messages",
            config.api_base.trim_end_matches('/'),
            config.channel_id
        );
        let limit = config.fetch_limit();
        if u16::from(limit) != config.limit {
            warn!(
                requested = config.limit,
                clamped = limit,
                "source.limit out of range, clamping"
            );
        }
        Self {
            client,
            url,
            limit,
            token: config.token.clone(),
        }
    }

    /// The messages endpoint, without the query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the most recent messages, newest first as the API returns
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingToken`] without a token,
    /// [`SourceError::Request`] on transport failure,
    /// [`SourceError::Status`] on a non-success status, and
    /// [`SourceError::Decode`] if the body is not a JSON array.
    pub async fn fetch_recent(&self) -> Result<Vec<RawMessage>, SourceError> {
        let token = self.token.as_ref().ok_or(SourceError::MissingToken)?;

        let response = self
            .client
            .get(&self.url)
            .query(&[("limit", self.limit)])
            .header(AUTHORIZATION, token.expose())
            .send()
            .await
            .map_err(|e| SourceError::Request {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| SourceError::Decode {
            origin: self.url.clone(),
            message: e.to_string(),
        })?;

        let messages = decode_batch(payload, &self.url)?;
        debug!(count = messages.len(), "channel messages fetched");
        Ok(messages)
    }
}

/// Cut `text` to at most `limit` bytes on a character boundary.
fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_owned();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    text.get(..end).unwrap_or_default().to_owned()
}
