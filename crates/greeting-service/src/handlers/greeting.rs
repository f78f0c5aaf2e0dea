//! Greeting handler.

use axum::extract::Path;
use tracing::instrument;

/// Handler for GET /greeting/{name}
///
/// Echoes the name with the current timestamp. Access requires the
/// user role, enforced by the policy in front of this handler.
#[instrument(skip_all, name = "greeting.handlers.greeting")]
pub async fn greeting(Path(name): Path<String>) -> String {
    format!(
        "Say Hello to {} at {}",
        name,
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f")
    )
}
