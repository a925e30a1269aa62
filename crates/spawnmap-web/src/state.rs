//! Shared application state for the spawn map server.
//!
//! [`AppState`] owns the spawn registry and every collaborator a refresh
//! cycle needs. It is created once at start-up with an empty registry and
//! injected into handlers through Axum's `State` extractor.

use spawnmap_core::config::MapConfig;
use spawnmap_core::{present, Clock, Extractor, SpawnRegistry};
use spawnmap_sources::{MessageFeed, SpriteCache};
use spawnmap_types::SpawnRecord;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::page;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) by the caller. The registry is the
/// only mutable part and sits behind a single async mutex.
#[derive(Debug)]
pub struct AppState {
    /// The held set of spawns.
    pub registry: Mutex<SpawnRegistry>,
    /// Where each refresh gets its batch.
    pub feed: MessageFeed,
    /// Icon resolver used during extraction.
    pub sprites: SpriteCache,
    /// Message parser.
    pub extractor: Extractor,
    /// Source of "now" for every cycle.
    pub clock: Clock,
    /// The rendered map page.
    pub page: String,
}

impl AppState {
    /// Create the state with an empty registry and render the map page.
    pub fn new(
        feed: MessageFeed,
        sprites: SpriteCache,
        extractor: Extractor,
        clock: Clock,
        map: &MapConfig,
    ) -> Self {
        let page = page::render(map, clock.zone());
        Self {
            registry: Mutex::new(SpawnRegistry::new()),
            feed,
            sprites,
            extractor,
            clock,
            page,
        }
    }

    /// Run one refresh cycle and return the live spawns as wire records.
    ///
    /// Never fails: a feed error is logged and the cycle proceeds with an
    /// empty batch.
    pub async fn refresh(&self) -> Vec<SpawnRecord> {
        let batch = self.feed.fetch_recent().await.unwrap_or_else(|e| {
            warn!(feed = self.feed.name(), error = %e, "fetch failed, treating as empty batch");
            Vec::new()
        });

        let mut registry = self.registry.lock().await;
        let now = self.clock.now();
        let summary = registry
            .refresh(&batch, &now, &self.extractor, &self.sprites)
            .await;
        let live = registry.live_events(&now);
        drop(registry);

        info!(
            feed = self.feed.name(),
            scanned = summary.scanned,
            rejected = summary.rejected,
            duplicates = summary.duplicates,
            expired = summary.expired,
            added = summary.added,
            held = summary.held,
            live = live.len(),
            "registry refreshed"
        );

        present::serialize(&live)
    }
}
