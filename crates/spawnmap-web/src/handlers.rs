//! Endpoint handlers for the spawn map server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Map page |
//! | `GET` | `/data` | Refresh, then live spawns as JSON |
//! | `GET` | `/healthz` | Liveness check |

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use spawnmap_types::SpawnRecord;

use crate::state::AppState;

/// Serve the map page.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

/// Run a refresh cycle and return the live spawns.
///
/// Always `200`; an unreachable channel yields the still-live part of the
/// held set.
pub async fn data(State(state): State<Arc<AppState>>) -> Json<Vec<SpawnRecord>> {
    Json(state.refresh().await)
}

/// Liveness check.
pub async fn healthz() -> &'static str {
    "ok"
}
