//! HTTP routes of the admin service.
//!
//! Routes are organized by concern:
//! - `config`: read and replace the configuration document
//! - `upload`: accept image uploads
//! - `commit`: publish the persisted state
//! - `progress`: server-sent publish progress
//! - `health`: liveness and load status

pub mod commit;
pub mod config;
pub mod health;
pub mod progress;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use storyadmin::assets::UPLOADS_URL_PREFIX;

use crate::state::AppState;

/// Largest accepted request body (configuration documents and uploads).
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Builds the complete router: API routes, uploaded assets under
/// `/uploads`, and the admin UI for everything else.
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.assets.uploads_dir());
    let admin_ui = ServeDir::new(&state.public_dir);

    Router::new()
        .route(
            "/api/config",
            get(config::get_config).post(config::save_config),
        )
        .route("/api/upload", post(upload::upload))
        .route("/api/commit", post(commit::commit))
        .route("/api/commit/progress", get(progress::publish_progress))
        .route("/api/health", get(health::health))
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .fallback_service(admin_ui)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
