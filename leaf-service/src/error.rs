//! Domain errors and their HTTP mapping.
//!
//! Every error leaves the service as `{"error": ..., "code": ...}` with a
//! stable, machine-readable `code`.

use crate::services::json_extract::ExtractError;
use crate::services::providers::ProviderError;
use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::{AppError, ErrorBody};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeafError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Remote API error: {0}")]
    RemoteApi(#[from] ProviderError),

    #[error("Model returned no usable text")]
    EmptyReply,

    #[error("Could not parse model output: {0}")]
    Parse(#[from] ExtractError),

    #[error("No uploaded image found; call /analyze first and pass its upload_id")]
    MissingState,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    App(#[from] AppError),
}

impl LeafError {
    pub fn status(&self) -> StatusCode {
        match self {
            LeafError::InvalidImage(_) | LeafError::MissingState | LeafError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            LeafError::RemoteApi(ProviderError::RateLimited) => StatusCode::SERVICE_UNAVAILABLE,
            LeafError::RemoteApi(_) | LeafError::EmptyReply | LeafError::Parse(_) => {
                StatusCode::BAD_GATEWAY
            }
            LeafError::MissingField(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LeafError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LeafError::App(err) => err.status(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LeafError::InvalidImage(_) => "invalid_image",
            LeafError::RemoteApi(ProviderError::RateLimited) => "rate_limited",
            LeafError::RemoteApi(_) => "remote_api_error",
            LeafError::EmptyReply => "empty_reply",
            LeafError::Parse(_) => "parse_error",
            LeafError::MissingState => "missing_state",
            LeafError::MissingField(_) => "missing_field",
            LeafError::BadRequest(_) => "bad_request",
            LeafError::Validation(_) => "validation_error",
            LeafError::App(_) => "internal_error",
        }
    }
}

impl From<JsonRejection> for LeafError {
    fn from(rejection: JsonRejection) -> Self {
        LeafError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for LeafError {
    fn from(rejection: MultipartRejection) -> Self {
        LeafError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for LeafError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        } else {
            tracing::warn!(code, error = %self, "Request rejected");
        }

        let body = match self {
            // Generic message; the cause chain goes to `details`.
            LeafError::App(AppError::InternalError(err)) => ErrorBody {
                error: "Internal server error".to_string(),
                code: Some(code),
                details: Some(format!("{:#}", err)),
            },
            other => ErrorBody {
                error: other.to_string(),
                code: Some(code),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
