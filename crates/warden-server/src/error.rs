//! Error types for the editor API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;
use warden_logs::LogError;
use warden_records::RecordError;

use crate::folders::FolderError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An invalid query parameter or path segment was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Log analysis failed.
    #[error(transparent)]
    Logs(#[from] LogError),

    /// Record handling failed.
    #[error(transparent)]
    Records(#[from] RecordError),

    /// The group lookup table could not be read.
    #[error(transparent)]
    Folders(#[from] FolderError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidQuery(_)
            | Self::Logs(LogError::InvalidDateTime(_) | LogError::InvalidWindow { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Logs(_) | Self::Records(_) | Self::Folders(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::NotFound(msg) | Self::InvalidQuery(msg) | Self::Internal(msg) => msg.clone(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %message, "request failed");
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
