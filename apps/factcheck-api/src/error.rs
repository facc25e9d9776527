//! Error types for the fact-check API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use factcheck_core::FactCheckError;
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Core(#[from] FactCheckError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Core(FactCheckError::Config(_)) => (StatusCode::BAD_REQUEST, "CONFIG_ERROR"),
            ApiError::Core(FactCheckError::DimensionMismatch { .. }) => {
                (StatusCode::BAD_REQUEST, "DIMENSION_MISMATCH")
            }
            ApiError::Core(FactCheckError::CorruptSnapshot(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CORRUPT_SNAPSHOT")
            }
            ApiError::Core(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
