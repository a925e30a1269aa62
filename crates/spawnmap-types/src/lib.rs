//! Shared type definitions for the spawn map service.
//!
//! Every crate in the workspace speaks in these types: the extractor
//! produces [`SpawnEvent`]s from [`RawMessage`]s, the registry holds them,
//! and the presentation layer turns them into [`SpawnRecord`]s for the map
//! page.
//!
//! # Modules
//!
//! - [`spawn`] -- The canonical spawn entity and its value types
//! - [`message`] -- Serde DTOs for chat messages and their embeds
//! - [`record`] -- JSON wire record served by `GET /data`

pub mod message;
pub mod record;
pub mod spawn;

// Re-export all public types at crate root for convenience.
pub use message::{Embed, RawMessage};
pub use record::SpawnRecord;
pub use spawn::{Coordinates, IconRef, SpawnEvent, Species};
