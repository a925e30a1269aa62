//! Axum router construction.
//!
//! Assembles the page, data, health, and sprite routes into a single
//! [`Router`] with CORS and request tracing.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- map page
/// - `GET /data` -- refresh and return live spawns
/// - `GET /healthz` -- liveness check
/// - `GET {public_prefix}/*` -- cached sprite files
///
/// CORS allows any origin so the feed can be consumed by other pages.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let assets = ServeDir::new(state.sprites.assets_dir());
    let prefix = state.sprites.public_prefix().to_owned();

    Router::new()
        .route("/", get(handlers::index))
        .route("/data", get(handlers::data))
        .route("/healthz", get(handlers::healthz))
        .nest_service(&prefix, assets)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
