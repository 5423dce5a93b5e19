//! HTTP error response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    /// Batch-level failure (e.g. the scan queue could not be read).
    Internal { error: String, details: String },
    /// Dependency probe failed.
    Unavailable { error: String, details: String },
}

impl ApiError {
    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::Internal {
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn unavailable(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::Unavailable {
            error: error.into(),
            details: details.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Unauthorized".to_string(),
                    details: None,
                },
            ),
            ApiError::Internal { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error,
                    details: Some(details),
                },
            ),
            ApiError::Unavailable { error, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error,
                    details: Some(details),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
