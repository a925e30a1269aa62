//! Configuration loading and typed config structures for the spawn map.
//!
//! The configuration lives in an optional `spawnmap.yaml`. Every field has a
//! default, so an absent file or a partial one is fine. The channel token is
//! a secret and is only ever read from the environment.
//!
//! Environment variables override YAML values:
//! - `DISCORD_TOKEN` sets `source.token`
//! - `SPAWNMAP_CHANNEL_ID` overrides `source.channel_id`
//! - `SPAWNMAP_TIME_ZONE` overrides `time.zone`
//! - `SPAWNMAP_PORT` overrides `server.port`

use core::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::clock::parse_zone;

/// Most messages the channel API returns per request.
pub const MAX_FETCH_LIMIT: u16 = 100;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not acceptable.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `spawnmap.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpawnMapConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerSection,

    /// Where announcements come from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Operating time zone and optional pinned clock.
    #[serde(default)]
    pub time: TimeConfig,

    /// Sprite cache and fallback image.
    #[serde(default)]
    pub sprites: SpriteConfig,

    /// Map page appearance.
    #[serde(default)]
    pub map: MapConfig,

    /// Log level and format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SpawnMapConfig {
    /// Load configuration from a YAML file, apply environment overrides,
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides,
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `SPAWNMAP_PORT` is not a port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `SPAWNMAP_PORT` is not a port.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.source.token = Some(SecretToken(token.trim().to_owned()));
        }
        if let Some(channel) = lookup("SPAWNMAP_CHANNEL_ID") {
            self.source.channel_id = channel;
        }
        if let Some(zone) = lookup("SPAWNMAP_TIME_ZONE") {
            self.time.zone = zone;
        }
        if let Some(port) = lookup("SPAWNMAP_PORT") {
            self.server.port = port.parse().map_err(|e| ConfigError::Invalid {
                field: "server.port",
                reason: format!("SPAWNMAP_PORT={port:?}: {e}"),
            })?;
        }
        Ok(())
    }

    /// Check ranges and names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero port, an empty channel,
    /// a sprite prefix that is not an absolute non-root path, or an unknown
    /// time zone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                field: "server.port",
                reason: "must be non-zero".to_owned(),
            });
        }
        if self.source.channel_id.trim().is_empty() && self.source.replay_file.is_none() {
            return Err(ConfigError::Invalid {
                field: "source.channel_id",
                reason: "must be set unless source.replay_file is used".to_owned(),
            });
        }
        let prefix = self.sprites.public_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') || prefix.len() < 2 {
            return Err(ConfigError::Invalid {
                field: "sprites.public_prefix",
                reason: format!("must be an absolute path below the root, got {prefix:?}"),
            });
        }
        parse_zone(&self.time.zone).map_err(|e| ConfigError::Invalid {
            field: "time.zone",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Channel API token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    /// Wrap a token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(***)")
    }
}

/// Message source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Channel API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Channel to poll.
    #[serde(default = "default_channel_id")]
    pub channel_id: String,

    /// Messages per poll as configured. See [`SourceConfig::fetch_limit`].
    #[serde(default = "default_limit")]
    pub limit: u16,

    /// Timeout for every outbound HTTP call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Read messages from this JSON file instead of polling the channel.
    #[serde(default)]
    pub replay_file: Option<PathBuf>,

    /// Channel API token, from `DISCORD_TOKEN` only.
    #[serde(skip)]
    pub token: Option<SecretToken>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            channel_id: default_channel_id(),
            limit: default_limit(),
            timeout_ms: default_timeout_ms(),
            replay_file: None,
            token: None,
        }
    }
}

impl SourceConfig {
    /// The configured limit clamped into `1..=100`.
    pub fn fetch_limit(&self) -> u8 {
        u8::try_from(self.limit.clamp(1, MAX_FETCH_LIMIT)).unwrap_or(u8::MAX)
    }
}

/// Time zone configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// IANA zone all timestamps are expressed in.
    #[serde(default = "default_zone")]
    pub zone: String,

    /// Pin the clock to this RFC 3339 instant (for replays).
    #[serde(default)]
    pub now: Option<String>,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            zone: default_zone(),
            now: None,
        }
    }
}

/// Sprite cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpriteConfig {
    /// Directory cached sprites are written to.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// URL prefix the web server serves `assets_dir` under.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,

    /// Species metadata endpoint; `/{name}` is appended.
    #[serde(default = "default_catalog_api")]
    pub catalog_api: String,

    /// Artwork base URL; `/{id}.png` is appended.
    #[serde(default = "default_artwork_base")]
    pub artwork_base: String,

    /// Image used whenever a sprite cannot be resolved.
    #[serde(default = "default_fallback_icon")]
    pub fallback_icon: String,

    /// Never fetch on a miss; serve the fallback instead.
    #[serde(default)]
    pub offline: bool,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            public_prefix: default_public_prefix(),
            catalog_api: default_catalog_api(),
            artwork_base: default_artwork_base(),
            fallback_icon: default_fallback_icon(),
            offline: false,
        }
    }
}

/// Map page configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapConfig {
    /// Initial map centre latitude.
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    /// Initial map centre longitude.
    #[serde(default = "default_center_lon")]
    pub center_lon: f64,

    /// Initial zoom level.
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Seconds between `/data` polls from the page.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u32,

    /// Marker image for the viewer's own position.
    #[serde(default = "default_user_icon")]
    pub user_icon: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
            zoom: default_zoom(),
            refresh_secs: default_refresh_secs(),
            user_icon: default_user_icon(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    5000
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_owned()
}

fn default_channel_id() -> String {
    "348769770671308800".to_owned()
}

const fn default_limit() -> u16 {
    MAX_FETCH_LIMIT
}

const fn default_timeout_ms() -> u64 {
    10_000
}

fn default_zone() -> String {
    "America/Los_Angeles".to_owned()
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("static/assets")
}

fn default_public_prefix() -> String {
    "/static/assets".to_owned()
}

fn default_catalog_api() -> String {
    "https://pokeapi.co/api/v2/pokemon".to_owned()
}

fn default_artwork_base() -> String {
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork"
        .to_owned()
}

fn default_fallback_icon() -> String {
    "https://cdn-icons-png.flaticon.com/512/188/188987.png".to_owned()
}

const fn default_center_lat() -> f64 {
    37.32
}

const fn default_center_lon() -> f64 {
    -121.88
}

const fn default_zoom() -> u8 {
    14
}

const fn default_refresh_secs() -> u32 {
    60
}

fn default_user_icon() -> String {
    "https://cdn-icons-png.flaticon.com/512/149/149060.png".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn parse_without_env(yaml: &str) -> SpawnMapConfig {
        let config: SpawnMapConfig = serde_yml::from_str(yaml).unwrap();
        config.validate().unwrap();
        config
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_without_env("{}");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.source.limit, 100);
        assert_eq!(config.source.channel_id, "348769770671308800");
        assert_eq!(config.time.zone, "America/Los_Angeles");
        assert_eq!(config.sprites.public_prefix, "/static/assets");
        assert_eq!(config.map.refresh_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.source.token.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r"
server:
  port: 8080
time:
  zone: Europe/London
sprites:
  offline: true
logging:
  format: json
";
        let config = parse_without_env(yaml);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.time.zone, "Europe/London");
        assert!(config.sprites.offline);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn limit_is_clamped_at_use() {
        let config = parse_without_env("source:\n  limit: 0\n");
        assert_eq!(config.source.fetch_limit(), 1);
        let config = parse_without_env("source:\n  limit: 40\n");
        assert_eq!(config.source.fetch_limit(), 40);
        let config = parse_without_env("source:\n  limit: 250\n");
        assert_eq!(config.source.fetch_limit(), 100);
        let config = parse_without_env("source:\n  limit: 1000\n");
        assert_eq!(config.source.limit, 1000);
        assert_eq!(config.source.fetch_limit(), 100);
    }

    #[test]
    fn unknown_zone_is_invalid() {
        let config: SpawnMapConfig = serde_yml::from_str("time:\n  zone: Nowhere/Land\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "time.zone", .. })
        ));
    }

    #[test]
    fn root_sprite_prefix_is_invalid() {
        let config: SpawnMapConfig =
            serde_yml::from_str("sprites:\n  public_prefix: /\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "sprites.public_prefix", .. })
        ));
    }

    #[test]
    fn overrides_apply_and_token_is_redacted() {
        let env: BTreeMap<&str, &str> = [
            ("DISCORD_TOKEN", " secret-token \n"),
            ("SPAWNMAP_CHANNEL_ID", "42"),
            ("SPAWNMAP_TIME_ZONE", "Asia/Tokyo"),
            ("SPAWNMAP_PORT", "9090"),
        ]
        .into_iter()
        .collect();

        let mut config = SpawnMapConfig::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| (*v).to_owned()))
            .unwrap();

        assert_eq!(config.source.channel_id, "42");
        assert_eq!(config.time.zone, "Asia/Tokyo");
        assert_eq!(config.server.port, 9090);
        let token = config.source.token.as_ref().unwrap();
        assert_eq!(token.expose(), "secret-token");
        assert!(!format!("{config:?}").contains("secret-token"));
    }

    #[test]
    fn bad_port_override_is_invalid() {
        let mut config = SpawnMapConfig::default();
        let result = config.apply_overrides(|name| {
            (name == "SPAWNMAP_PORT").then(|| "eighty".to_owned())
        });
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "server.port", .. })
        ));
    }

    #[test]
    fn replay_without_channel_is_allowed() {
        let config = parse_without_env("source:\n  channel_id: ''\n  replay_file: captured.json\n");
        assert_eq!(
            config.source.replay_file.as_deref(),
            Some(Path::new("captured.json"))
        );
    }
}
