//! Current user handler.
//!
//! Returns the authenticated principal from the request's
//! authentication context.

use crate::errors::ApiError;
use auth_core::context::AuthContext;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for the `/me` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Principal subject from the token.
    pub sub: String,

    /// Authorities derived from the token's role claims, sorted for
    /// stable output.
    pub authorities: Vec<String>,
}

/// Handler for GET /me
///
/// Echoes the authenticated principal. The path itself is open in the
/// default policy, so the handler demands a principal rather than
/// relying on a rule.
///
/// ## Response
///
/// ```json
/// {
///   "sub": "abc-123",
///   "authorities": ["ROLE_USER"]
/// }
/// ```
#[instrument(skip_all, name = "greeting.handlers.me")]
pub async fn current_user(
    Extension(context): Extension<AuthContext>,
) -> Result<Json<MeResponse>, ApiError> {
    match context {
        AuthContext::Authenticated {
            subject,
            authorities,
        } => {
            tracing::debug!(target: "greeting.handlers.me", "Returning current principal");

            let mut authorities: Vec<String> = authorities.into_iter().collect();
            authorities.sort();

            Ok(Json(MeResponse {
                sub: subject,
                authorities,
            }))
        }
        AuthContext::Anonymous => {
            tracing::debug!(target: "greeting.handlers.me", "No principal in context");
            Err(ApiError::Unauthorized)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_authenticated_principal_is_echoed() {
        let context = AuthContext::authenticated(
            "abc-123".to_string(),
            HashSet::from(["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()]),
        );

        let Json(response) = current_user(Extension(context)).await.unwrap();

        assert_eq!(response.sub, "abc-123");
        assert_eq!(
            response.authorities,
            vec!["ROLE_ADMIN".to_string(), "ROLE_USER".to_string()]
        );
    }

    #[tokio::test]
    async fn test_anonymous_context_is_unauthorized() {
        let result = current_user(Extension(AuthContext::Anonymous)).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_me_response_serialization() {
        let response = MeResponse {
            sub: "user123".to_string(),
            authorities: vec!["ROLE_USER".to_string()],
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"sub\":\"user123\""));
        assert!(json.contains("\"authorities\":[\"ROLE_USER\"]"));
    }
}
