//! Mapping of library errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use storyadmin::api::ErrorBody;
use storyadmin::{AssetError, ConfigError, PublishError};

/// Error returned by every handler. Rendered as `{error, code}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Asset(AssetError::Empty) => StatusCode::BAD_REQUEST,
            ApiError::Publish(PublishError::MissingCredentials) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Config(_) | ApiError::Asset(_) | ApiError::Publish(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Config(ConfigError::NotLoaded) => "CONFIG_NOT_LOADED",
            ApiError::Config(ConfigError::Write { .. }) => "CONFIG_WRITE_FAILED",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Asset(AssetError::Empty) => "NO_FILE",
            ApiError::Asset(_) => "UPLOAD_FAILED",
            ApiError::Publish(e) => e.code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::warn!("Rejected request: {}", self);
        }

        let body = ErrorBody {
            error: self.to_string(),
            code: Some(self.code().to_string()),
        };
        (status, Json(body)).into_response()
    }
}
