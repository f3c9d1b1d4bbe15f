//! Publish route.

use axum::extract::State;
use axum::Json;

use storyadmin::api::{CommitRequest, CommitResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/commit`: the body (`{message?}`) is optional.
pub async fn commit(
    State(state): State<AppState>,
    body: Option<Json<CommitRequest>>,
) -> Result<Json<CommitResponse>, ApiError> {
    let message = body.and_then(|Json(request)| request.message);
    let receipt = state.pipeline.publish(message.as_deref()).await?;

    let message = if receipt.pushed {
        "Changes committed and pushed successfully".to_string()
    } else {
        receipt.message
    };

    Ok(Json(CommitResponse {
        success: true,
        message,
        commit_hash: receipt.commit_hash,
    }))
}
