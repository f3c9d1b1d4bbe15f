//! Configuration document routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use storyadmin::api::SaveResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/config`
pub async fn get_config(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.store.get()?))
}

/// `POST /api/config`: replaces the whole document.
pub async fn save_config(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(document) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if !document.is_object() {
        return Err(ApiError::BadRequest(
            "Configuration must be a JSON object".to_string(),
        ));
    }

    state.store.replace(document).await?;
    log::info!("Configuration saved");

    Ok(Json(SaveResponse {
        success: true,
        message: "Configuration saved successfully".to_string(),
    }))
}
