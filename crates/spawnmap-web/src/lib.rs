//! HTTP surface of the spawn map service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Map page** (`GET /`): Leaflet over `OpenStreetMap` tiles, polling
//!   `/data` on an interval and placing one marker per live spawn
//! - **Data feed** (`GET /data`): runs one refresh cycle and returns the
//!   live spawns as a JSON array
//! - **Sprite assets** (`GET {public_prefix}/*`): files from the sprite
//!   cache directory
//! - **Liveness check** (`GET /healthz`)
//!
//! # Architecture
//!
//! Refreshes are request-driven. Each `/data` request fetches a batch from
//! the [`MessageFeed`] without holding any lock, then takes the registry
//! mutex and runs refresh, live-view, and serialization inside one
//! critical section. A failed fetch is logged and treated as an empty
//! batch, so the held set is still filtered and served.
//!
//! [`MessageFeed`]: spawnmap_sources::MessageFeed

pub mod handlers;
pub mod page;
pub mod router;
pub mod server;
pub mod state;

pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
