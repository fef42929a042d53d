//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;

use crate::cloudinary::TranscodeError;

/// Custom error type for the API service
///
/// Every variant maps to a fixed response body. Upstream and database
/// detail stays in the `Display` output, which only reaches the logs.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No verified caller identity
    #[error("Unauthorized")]
    Unauthorized,

    /// Provider credentials are not configured
    #[error("Cloudinary credentials not found")]
    Configuration,

    /// Missing or malformed `file` part
    #[error("Invalid file input: {0}")]
    InvalidInput(String),

    /// The media provider rejected or failed the upload
    #[error("Upload video failed: {0}")]
    Upstream(#[from] TranscodeError),

    /// Writing the video record failed
    #[error("Failed to persist video: {0}")]
    Persistence(#[source] DatabaseError),

    /// Reading video records failed
    #[error("Failed to fetch videos: {0}")]
    Query(#[source] DatabaseError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Configuration => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Cloudinary credentials not found",
            ),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid file input"),
            ApiError::Upstream(_) | ApiError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Upload video failed")
            }
            ApiError::Query(_) => (StatusCode::INTERNAL_SERVER_ERROR, "fetching video"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
