//! Metrics definitions for the greeting service.
//!
//! All metrics follow Prometheus naming conventions with a `greeting_`
//! prefix and `_total` suffix for counters.
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `outcome`: "authenticated" plus the fixed set of validation
//!   failure kinds
//! - `principal`: 2 values (authenticated, anonymous)
//!
//! An elevated rate of `outcome="key_store_unavailable"` is the
//! operator signal for an identity provider outage, as opposed to a
//! surge of bad tokens.

use metrics::counter;

/// Record the outcome of authenticating one request that presented a
/// token.
///
/// Metric: `greeting_auth_outcomes_total`
/// Labels: `outcome`
pub fn record_auth_outcome(outcome: &'static str) {
    counter!("greeting_auth_outcomes_total", "outcome" => outcome).increment(1);
}

/// Record a policy denial.
///
/// Metric: `greeting_policy_denials_total`
/// Labels: `principal` ("authenticated" maps to 403, "anonymous" to 401)
pub fn record_policy_denial(authenticated: bool) {
    let principal = if authenticated {
        "authenticated"
    } else {
        "anonymous"
    };
    counter!("greeting_policy_denials_total", "principal" => principal).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_does_not_panic_without_recorder() {
        // The metrics crate no-ops when no recorder is installed; these
        // must be safe to call from any context.
        record_auth_outcome("authenticated");
        record_auth_outcome("expired");
        record_policy_denial(true);
        record_policy_denial(false);
    }
}
