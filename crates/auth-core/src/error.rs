//! Validation error taxonomy.
//!
//! Every way a bearer token can be rejected has its own variant so that
//! logs and metrics can tell them apart, but the `Display` messages are
//! intentionally generic: callers return them to clients verbatim and
//! must not leak which check failed.

use thiserror::Error;

/// Errors produced by token validation and key resolution.
///
/// All validation-kind variants share one client-facing message; the
/// distinction is preserved for logging and metrics via [`kind`].
/// `KeyStoreUnavailable` is the exception: it means the identity
/// provider could not be reached, which callers surface as a service
/// availability problem rather than an authorization failure.
///
/// [`kind`]: AuthError::kind
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token is structurally invalid (size, format, header contents).
    #[error("The access token is invalid or expired")]
    Malformed,

    /// No verification key matches the token's key id, even after a refresh.
    #[error("The access token is invalid or expired")]
    KeyNotFound,

    /// The identity provider's discovery or key endpoint is unreachable.
    #[error("Authorization server unavailable")]
    KeyStoreUnavailable,

    /// Signature verification failed against the resolved key.
    #[error("The access token is invalid or expired")]
    BadSignature,

    /// The `exp` claim is in the past (beyond clock-skew tolerance).
    #[error("The access token is invalid or expired")]
    Expired,

    /// The `nbf` claim is in the future (beyond clock-skew tolerance).
    #[error("The access token is invalid or expired")]
    NotYetValid,

    /// The `iss` claim does not equal the trusted issuer.
    #[error("The access token is invalid or expired")]
    BadIssuer,

    /// The `aud` claim does not contain the expected audience.
    #[error("The access token is invalid or expired")]
    BadAudience,
}

impl AuthError {
    /// Stable label for logs and bounded-cardinality metric labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Malformed => "malformed",
            AuthError::KeyNotFound => "key_not_found",
            AuthError::KeyStoreUnavailable => "key_store_unavailable",
            AuthError::BadSignature => "bad_signature",
            AuthError::Expired => "expired",
            AuthError::NotYetValid => "not_yet_valid",
            AuthError::BadIssuer => "bad_issuer",
            AuthError::BadAudience => "bad_audience",
        }
    }

    /// Whether this failure indicates a provider outage rather than a
    /// bad token.
    #[must_use]
    pub fn is_unavailability(&self) -> bool {
        matches!(self, AuthError::KeyStoreUnavailable)
    }
}
