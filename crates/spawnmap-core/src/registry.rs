//! The held set of spawns.
//!
//! Each refresh cycle does the same three things in the same order:
//!
//! 1. Parse a candidate from every message, skipping failures.
//! 2. Drop candidates whose coordinates match anything currently held
//!    (live or not) or an earlier candidate from the same batch. Only the
//!    candidates that survive get an icon.
//! 3. Filter the held set down to what is live at `now`, then append the
//!    surviving candidates.
//!
//! Step 2 runs against the held set *before* step 3 filters it, so an
//! expired entry that has not been dropped yet still blocks a new spawn at
//! the same spot for one cycle.

use std::collections::HashSet;

use chrono::DateTime;
use chrono_tz::Tz;
use spawnmap_types::{RawMessage, SpawnEvent};
use tracing::debug;

use crate::extract::Extractor;
use crate::icons::IconResolver;

/// Counters from one refresh cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Messages examined.
    pub scanned: usize,
    /// Messages that did not parse into a spawn.
    pub rejected: usize,
    /// Parsed spawns dropped as duplicates of a known location.
    pub duplicates: usize,
    /// Held entries dropped because they expired.
    pub expired: usize,
    /// New entries appended.
    pub added: usize,
    /// Size of the held set after the cycle.
    pub held: usize,
}

/// In-memory set of spawns, owned by whoever serves them.
#[derive(Debug, Clone, Default)]
pub struct SpawnRegistry {
    held: Vec<SpawnEvent>,
}

impl SpawnRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self { held: Vec::new() }
    }

    /// Merge a batch of messages into the held set as of `now`.
    pub async fn refresh<R: IconResolver>(
        &mut self,
        messages: &[RawMessage],
        now: &DateTime<Tz>,
        extractor: &Extractor,
        icons: &R,
    ) -> RefreshSummary {
        let mut summary = RefreshSummary {
            scanned: messages.len(),
            ..RefreshSummary::default()
        };

        let mut occupied: HashSet<(u64, u64)> =
            self.held.iter().map(|event| event.location.key()).collect();
        let mut fresh = Vec::new();

        for message in messages {
            let Some(sighting) = extractor.sighting(message, now) else {
                summary.rejected = summary.rejected.saturating_add(1);
                continue;
            };
            if !occupied.insert(sighting.location.key()) {
                debug!(
                    species = %sighting.species,
                    location = %sighting.location,
                    "duplicate location, keeping first sighting"
                );
                summary.duplicates = summary.duplicates.saturating_add(1);
                continue;
            }
            let icon = icons.resolve(&sighting.species).await;
            fresh.push(sighting.into_event(icon));
        }

        let before = self.held.len();
        self.held.retain(|event| event.is_live(now));
        summary.expired = before.saturating_sub(self.held.len());

        summary.added = fresh.len();
        self.held.extend(fresh);
        summary.held = self.held.len();
        summary
    }

    /// Copies of every held spawn that is live at `now`, in insertion
    /// order.
    pub fn live_events(&self, now: &DateTime<Tz>) -> Vec<SpawnEvent> {
        self.held
            .iter()
            .filter(|event| event.is_live(now))
            .cloned()
            .collect()
    }

    /// Everything held, including entries that expired since the last
    /// refresh.
    pub fn held(&self) -> &[SpawnEvent] {
        &self.held
    }

    /// Number of held entries.
    pub const fn len(&self) -> usize {
        self.held.len()
    }

    /// Whether nothing is held.
    pub const fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}
