//! Error mapping from the localization pipeline to HTTP responses.
//!
//! Every rejected request gets a JSON body with a machine-readable code and
//! a human-readable message carrying enough detail to reconstruct why the
//! input was rejected.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::LocateError;

/// API-level error: a pipeline error or a malformed request body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Pipeline rejection, surfaced with its own taxonomy.
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// The request itself was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// Shorthand for a malformed request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Locate(LocateError::Shape { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Locate(LocateError::Decode { .. }) => StatusCode::BAD_REQUEST,
            Self::Locate(LocateError::InvalidLocation { .. }) => StatusCode::BAD_REQUEST,
            Self::Locate(LocateError::NoEstimate) => StatusCode::CONFLICT,
            Self::Locate(LocateError::Inference(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Locate(LocateError::Shape { .. }) => "SHAPE_MISMATCH",
            Self::Locate(LocateError::Decode { .. }) => "DECODE_ERROR",
            Self::Locate(LocateError::InvalidLocation { .. }) => "INVALID_LOCATION",
            Self::Locate(LocateError::NoEstimate) => "NO_ESTIMATE",
            Self::Locate(LocateError::Inference(_)) => "INFERENCE_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
