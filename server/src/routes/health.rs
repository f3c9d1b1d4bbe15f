use axum::extract::State;
use axum::Json;

use storyadmin::api::HealthResponse;

use crate::state::AppState;

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        config_loaded: state.store.is_loaded(),
    })
}
