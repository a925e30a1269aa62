//! On-disk sprite cache with a fetch-on-miss policy.
//!
//! Lookup order for a species `name`:
//!
//! 1. `{assets_dir}/{name}.png` exists: return `{public_prefix}/{name}.png`.
//! 2. Offline: return the fallback image.
//! 3. Fetch `{catalog_api}/{name}`, read its numeric `id`, fetch
//!    `{artwork_base}/{id}.png`, write it to the cache, return the local
//!    path.
//! 4. Any failure along the way: return the fallback image.
//!
//! Writes go to a uniquely named temporary file in the cache directory and
//! are renamed into place, so concurrent misses for the same species each
//! produce a complete file and the last rename wins.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use spawnmap_core::config::SpriteConfig;
use spawnmap_core::IconResolver;
use spawnmap_types::{IconRef, Species};
use tracing::{debug, info, warn};

use crate::error::SourceError;

/// Distinguishes temporary files written by concurrent fills.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The subset of the species metadata document the cache needs.
#[derive(Debug, serde::Deserialize)]
struct SpeciesMeta {
    id: u32,
}

/// Remote catalog used to fill misses.
#[derive(Debug, Clone)]
struct Catalog {
    client: reqwest::Client,
    api: String,
    artwork_base: String,
}

impl Catalog {
    async fn species_id(&self, species: &Species) -> Result<u32, SourceError> {
        let url = format!("{}/{species}", self.api.trim_end_matches('/'));
        let response = self.get(&url).await?;
        let meta: SpeciesMeta = response.json().await.map_err(|e| SourceError::Decode {
            origin: url,
            message: e.to_string(),
        })?;
        Ok(meta.id)
    }

    async fn artwork(&self, id: u32) -> Result<Vec<u8>, SourceError> {
        let url = format!("{}/{id}.png", self.artwork_base.trim_end_matches('/'));
        let response = self.get(&url).await?;
        let bytes = response.bytes().await.map_err(|e| SourceError::Request {
            url: url.clone(),
            message: e.to_string(),
        })?;
        if bytes.is_empty() {
            return Err(SourceError::Decode {
                origin: url,
                message: "empty image body".to_owned(),
            });
        }
        Ok(bytes.to_vec())
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Request {
                url: url.to_owned(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(response)
    }
}

/// Species-keyed image cache backed by a directory.
#[derive(Debug, Clone)]
pub struct SpriteCache {
    assets_dir: PathBuf,
    public_prefix: String,
    fallback: IconRef,
    catalog: Option<Catalog>,
}

impl SpriteCache {
    /// Create a cache from the `sprites` config section.
    ///
    /// With `offline: true` misses are never filled.
    pub fn new(config: &SpriteConfig, client: reqwest::Client) -> Self {
        let catalog = (!config.offline).then(|| Catalog {
            client,
            api: config.catalog_api.clone(),
            artwork_base: config.artwork_base.clone(),
        });
        Self {
            assets_dir: config.assets_dir.clone(),
            public_prefix: config.public_prefix.trim_end_matches('/').to_owned(),
            fallback: IconRef::new(config.fallback_icon.clone()),
            catalog,
        }
    }

    /// Create the cache directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the directory cannot be created.
    pub async fn prepare(&self) -> Result<(), SourceError> {
        tokio::fs::create_dir_all(&self.assets_dir)
            .await
            .map_err(|source| SourceError::Io {
                path: self.assets_dir.clone(),
                source,
            })?;
        info!(
            assets_dir = %self.assets_dir.display(),
            online = self.catalog.is_some(),
            "sprite cache ready"
        );
        Ok(())
    }

    /// Directory the cached files live in.
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// URL prefix the cached files are served under.
    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// The image returned whenever resolution fails.
    pub const fn fallback(&self) -> &IconRef {
        &self.fallback
    }

    /// Resolve the icon for `species`, filling the cache on a miss.
    pub async fn lookup(&self, species: &Species) -> IconRef {
        let path = self.sprite_path(species);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return self.public_ref(species);
        }

        let Some(catalog) = &self.catalog else {
            debug!(%species, "sprite miss while offline, using fallback");
            return self.fallback.clone();
        };

        if let Err(e) = self.fill(catalog, species, &path).await {
            warn!(%species, error = %e, "sprite fetch failed, using fallback");
            return self.fallback.clone();
        }
        info!(%species, path = %path.display(), "sprite cached");
        self.public_ref(species)
    }

    async fn fill(&self, catalog: &Catalog, species: &Species, path: &Path) -> Result<(), SourceError> {
        let id = catalog.species_id(species).await?;
        let bytes = catalog.artwork(id).await?;
        write_atomically(&self.assets_dir, path, &bytes).await
    }

    fn sprite_path(&self, species: &Species) -> PathBuf {
        self.assets_dir.join(format!("{species}.png"))
    }

    fn public_ref(&self, species: &Species) -> IconRef {
        IconRef::new(format!("{}/{species}.png", self.public_prefix))
    }
}

impl IconResolver for SpriteCache {
    async fn resolve(&self, species: &Species) -> IconRef {
        self.lookup(species).await
    }
}

/// Write `bytes` to a fresh temporary file in `dir`, then rename it onto
/// `path`.
async fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), SourceError> {
    let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp = dir.join(format!(".sprite-{}-{sequence}.tmp", std::process::id()));

    if let Err(source) = tokio::fs::write(&temp, bytes).await {
        return Err(SourceError::Io { path: temp, source });
    }
    if let Err(source) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(SourceError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use axum::extract::{Path as UrlPath, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};

    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    #[derive(Clone, Default)]
    struct Hits(Arc<AtomicUsize>);

    async fn species_meta(
        State(hits): State<Hits>,
        UrlPath(name): UrlPath<String>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        hits.0.fetch_add(1, Ordering::SeqCst);
        match name.as_str() {
            "mewtwo" => Ok(Json(serde_json::json!({"id": 150, "name": "mewtwo"}))),
            "missingno" => Ok(Json(serde_json::json!({"id": 0}))),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn artwork(UrlPath(file): UrlPath<String>) -> Result<&'static [u8], StatusCode> {
        if file == "150.png" {
            Ok(PNG)
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    async fn serve_catalog(hits: Hits) -> String {
        let app = Router::new()
            .route("/api/v2/pokemon/{name}", get(species_meta))
            .route("/artwork/{file}", get(artwork))
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config(dir: &Path, base: &str, offline: bool) -> SpriteConfig {
        SpriteConfig {
            assets_dir: dir.to_path_buf(),
            public_prefix: "/static/assets/".to_owned(),
            catalog_api: format!("{base}/api/v2/pokemon"),
            artwork_base: format!("{base}/artwork"),
            fallback_icon: "https://fallback.invalid/unknown.png".to_owned(),
            offline,
        }
    }

    fn client() -> reqwest::Client {
        crate::build_client(Duration::from_secs(5)).unwrap()
    }

    fn species(name: &str) -> Species {
        Species::parse(name).unwrap()
    }

    #[tokio::test]
    async fn miss_fetches_writes_and_then_hits() {
        let dir = tempfile::tempdir().unwrap();
        let hits = Hits::default();
        let base = serve_catalog(hits.clone()).await;
        let cache = SpriteCache::new(&config(dir.path(), &base, false), client());
        cache.prepare().await.unwrap();

        let icon = cache.resolve(&species("mewtwo")).await;
        assert_eq!(icon.as_str(), "/static/assets/mewtwo.png");
        assert_eq!(std::fs::read(dir.path().join("mewtwo.png")).unwrap(), PNG);

        let again = cache.resolve(&species("mewtwo")).await;
        assert_eq!(again, icon);
        assert_eq!(hits.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn catalog_failures_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let base = serve_catalog(Hits::default()).await;
        let cache = SpriteCache::new(&config(dir.path(), &base, false), client());

        // Unknown species: metadata 404.
        let icon = cache.resolve(&species("fakemon")).await;
        assert_eq!(icon, *cache.fallback());

        // Known species, artwork 404.
        let icon = cache.resolve(&species("missingno")).await;
        assert_eq!(icon.as_str(), "https://fallback.invalid/unknown.png");
        assert!(!dir.path().join("missingno.png").exists());
    }

    #[tokio::test]
    async fn offline_cache_serves_hits_and_falls_back_on_misses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dratini.png"), PNG).unwrap();
        let cache = SpriteCache::new(&config(dir.path(), "http://127.0.0.1:9", true), client());

        assert_eq!(
            cache.resolve(&species("dratini")).await.as_str(),
            "/static/assets/dratini.png"
        );
        assert_eq!(cache.resolve(&species("mewtwo")).await, *cache.fallback());
    }

    #[tokio::test]
    async fn concurrent_misses_leave_one_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = serve_catalog(Hits::default()).await;
        let cache = SpriteCache::new(&config(dir.path(), &base, false), client());
        let mewtwo = species("mewtwo");

        let (a, b) = tokio::join!(cache.resolve(&mewtwo), cache.resolve(&mewtwo));
        assert_eq!(a, b);
        assert_eq!(std::fs::read(dir.path().join("mewtwo.png")).unwrap(), PNG);

        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
