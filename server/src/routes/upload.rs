//! Image upload route.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;

use storyadmin::api::UploadResponse;
use storyadmin::AssetError;

use crate::error::ApiError;
use crate::state::AppState;

/// Filename used when the multipart part carries none.
const UNNAMED_UPLOAD: &str = "upload";

/// `POST /api/upload`: multipart field `file`, optional text field
/// `category`.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut file = None;
    let mut category = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let original_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(UNNAMED_UPLOAD)
                    .to_string();
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                file = Some((original_name, content));
            }
            Some("category") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                category = Some(value);
            }
            _ => log::debug!("Ignoring multipart field {:?}", name),
        }
    }

    let (original_name, content) = file.ok_or(AssetError::Empty)?;
    let asset = state
        .assets
        .store(&content, &original_name, category.as_deref())
        .await?;

    Ok(Json(UploadResponse {
        success: true,
        url: asset.served_url,
        filename: asset.stored_filename,
        original_name: asset.original_filename,
    }))
}
