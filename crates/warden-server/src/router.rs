//! Axum router construction for the editor API.
//!
//! Assembles all routes into a single [`Router`] with CORS and request
//! tracing middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /api/status` -- configuration and cache state
/// - `GET /api/logs/stash-report` -- stash burial/recovery totals
/// - `GET /api/logs/export` -- ranged admin log export
/// - `GET /api/records/{group}/{file}` -- read a record document
/// - `PUT /api/records/{group}/{file}` -- overwrite a record document
/// - `GET /api/changelog` -- changelog text
/// - `POST /api/groups/reload` -- re-read the group table
///
/// CORS allows any origin; the editor UI is served separately.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/status", get(handlers::status))
        // Log analysis
        .route("/api/logs/stash-report", get(handlers::stash_report))
        .route("/api/logs/export", get(handlers::export_logs))
        // Record documents
        .route(
            "/api/records/{group}/{file}",
            get(handlers::get_record).put(handlers::put_record),
        )
        .route("/api/changelog", get(handlers::get_changelog))
        .route("/api/groups/reload", post(handlers::reload_groups))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
