//! Health check handler.
//!
//! Liveness probe. The service keeps no persistent state, so there is
//! nothing to ping; reachability is the signal.

use axum::Json;
use serde::Serialize;
use tracing::instrument;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" when the service can answer at all.
    pub status: String,
}

/// Handler for GET /health
#[instrument(skip_all, name = "greeting.handlers.health")]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
