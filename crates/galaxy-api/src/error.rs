//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use galaxy_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Handler error wrapper so `AppError` can become a response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::WeakPassword => StatusCode::BAD_REQUEST,
        ErrorKind::MissingToken
        | ErrorKind::InvalidCredentials
        | ErrorKind::TokenExpired
        | ErrorKind::RefreshTokenInvalid => StatusCode::UNAUTHORIZED,
        ErrorKind::InvalidToken | ErrorKind::InvalidAlgorithm | ErrorKind::TokenRevoked => {
            StatusCode::FORBIDDEN
        }
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::AccountLocked => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Execution => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Configuration
        | ErrorKind::Database
        | ErrorKind::Cache
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    /// Status code and body, logging server-side detail first.
    pub fn parts(&self) -> (StatusCode, ApiErrorResponse) {
        let err = &self.0;
        if err.kind.is_internal() {
            tracing::error!(kind = ?err.kind, error = %err, source = ?err.source, "Internal server error");
        }
        (
            status_for(err.kind),
            ApiErrorResponse {
                error: err.kind.code().to_string(),
                message: err.public_message().to_string(),
                details: err.public_details().cloned(),
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::TokenRevoked), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::InvalidAlgorithm), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::AccountLocked), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::WeakPassword), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let (status, body) = ApiError(AppError::database("relation users does not exist")).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "INTERNAL_ERROR");
        assert_eq!(body.message, "Internal server error");
        assert!(body.details.is_none());
    }
}
