//! Greeting service error types.
//!
//! All errors map to appropriate HTTP status codes via the
//! `IntoResponse` impl. Messages returned to clients are intentionally
//! generic: every token validation failure collapses to the same 401
//! body so responses cannot be used as an oracle on token structure.
//! The specific failure kind is logged and counted server-side.

use auth_core::error::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Greeting service error type.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 (missing/invalid token, or anonymous on a protected path)
/// - Forbidden: 403 (authenticated but lacking the required authority)
/// - ServiceUnavailable: 503 (identity provider unreachable)
/// - Internal: 500
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error (for metrics recording).
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized => 401,
            ApiError::Forbidden => 403,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::Internal => 500,
        }
    }
}

/// Provider outage surfaces as 503 so operators can tell "provider
/// down" from "bad caller"; every other validation failure collapses
/// to the generic 401.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_unavailability() {
            ApiError::ServiceUnavailable(err.kind().to_string())
        } else {
            ApiError::Unauthorized
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "The access token is invalid or expired".to_string(),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Insufficient privileges".to_string(),
            ),
            ApiError::ServiceUnavailable(reason) => {
                // Log actual reason server-side, return generic message
                tracing::warn!(target: "greeting.availability", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"greeting-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
