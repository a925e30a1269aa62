//! The icon resolution seam.
//!
//! The extractor asks an [`IconResolver`] for every spawn it produces. The
//! production resolver is the on-disk sprite cache in `spawnmap-sources`;
//! the contract here is only that resolution always yields *some*
//! [`IconRef`] (falling back to a placeholder) and is safe to repeat.

use std::future::Future;

use spawnmap_types::{IconRef, Species};

/// Maps a species to a displayable image.
///
/// Implementations must be idempotent and must not fail: any error is
/// absorbed into a fallback reference.
pub trait IconResolver: Sync {
    /// Resolve the icon for `species`.
    fn resolve(&self, species: &Species) -> impl Future<Output = IconRef> + Send;
}

/// Resolver that maps every species to a path under a fixed prefix.
#[cfg(test)]
pub(crate) struct PrefixIcons(pub &'static str);

#[cfg(test)]
impl IconResolver for PrefixIcons {
    async fn resolve(&self, species: &Species) -> IconRef {
        IconRef::new(format!("{}/{species}.png", self.0))
    }
}
