//! Parsing and expiry core of the spawn map service.
//!
//! Turns free-text channel announcements into [`SpawnEvent`]s and keeps the
//! set of live spawns. Everything here is transport-agnostic: the HTTP
//! fetcher and sprite downloader live in `spawnmap-sources`, the web surface
//! in `spawnmap-web`.
//!
//! # Modules
//!
//! - [`clock`] -- Zoned clock, end-time placement, and drift correction
//! - [`extract`] -- Regex parser chain from one message to one spawn
//! - [`icons`] -- The icon resolution seam used by the extractor
//! - [`registry`] -- The held set: dedup, filter-then-append, live view
//! - [`present`] -- Live spawns to JSON wire records
//! - [`config`] -- YAML configuration with environment overrides
//!
//! [`SpawnEvent`]: spawnmap_types::SpawnEvent

pub mod clock;
pub mod config;
pub mod extract;
pub mod icons;
pub mod present;
pub mod registry;

pub use clock::{Clock, ClockError};
pub use config::{ConfigError, SpawnMapConfig};
pub use extract::{ExtractError, Extractor, Sighting};
pub use icons::IconResolver;
pub use registry::{RefreshSummary, SpawnRegistry};
