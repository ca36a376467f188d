//! Core error → HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use medexam_core::error::CoreError;

/// Wrapper giving `CoreError` an HTTP shape. Every handler returns
/// `Result<_, ApiError>` and lets `?` do the mapping.
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            CoreError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({"error": self.0.to_string()}),
            ),
            CoreError::Forbidden(_) => {
                (StatusCode::FORBIDDEN, json!({"error": self.0.to_string()}))
            }
            CoreError::NotFound(_) => {
                (StatusCode::NOT_FOUND, json!({"error": self.0.to_string()}))
            }
            CoreError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                json!({"error": self.0.to_string()}),
            ),
            CoreError::Conflict(_) => (StatusCode::CONFLICT, json!({"error": self.0.to_string()})),
            CoreError::UpstreamAi { detail } => (
                StatusCode::BAD_GATEWAY,
                json!({"error": self.0.to_string(), "detail": detail}),
            ),
            CoreError::ResponseParse { raw } => (
                StatusCode::BAD_GATEWAY,
                json!({"error": self.0.to_string(), "raw": raw}),
            ),
            CoreError::Internal(err) => {
                tracing::error!(error = ?err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "internal server error"}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
