use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::PkiError;

/// Error returned by the HTTP handlers, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or incomplete request (400).
    BadRequest(String),
    /// Missing or rejected credentials (401).
    Unauthorized,
    /// Failure reported by the certificate authority.
    Pki(PkiError),
}

impl From<PkiError> for ApiError {
    fn from(err: PkiError) -> Self {
        ApiError::Pki(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Pki(err) if err.is_client_error() => {
                tracing::warn!(error = %err, "rejected request");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Pki(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
