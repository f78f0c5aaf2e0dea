//! HTTP routes for the greeting service.
//!
//! Defines the Axum router: API routes behind the authentication
//! middleware, operational routes (`/metrics`) outside it.

use crate::handlers;
use crate::middleware::AuthState;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use metrics_exporter_prometheus::{BuildError, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Install the Prometheus metrics recorder.
///
/// Must be called once per process, before the first request.
///
/// # Errors
///
/// Returns [`BuildError`] if a recorder is already installed.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/greeting/{name}` - protected greeting endpoint
/// - `/me` - current principal echo
/// - `/health` - liveness probe
/// - `/metrics` - Prometheus scrape endpoint (outside the auth layer)
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(auth: Arc<AuthState>, metrics_handle: PrometheusHandle) -> Router {
    // Every API route runs the full authentication/authorization
    // pipeline; the policy engine decides which are actually protected
    let api_routes = Router::new()
        .route("/greeting/:name", get(handlers::greeting))
        .route("/me", get(handlers::current_user))
        .route("/health", get(handlers::health_check))
        .layer(from_fn_with_state(auth, crate::middleware::authenticate));

    // Operational routes bypass authentication so scrapers keep
    // working when the identity provider is down
    let ops_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    api_routes
        .merge(ops_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
