//! Per-request authentication context.
//!
//! The output of the validation pipeline, consumed by the policy
//! engine and by handlers via request extensions. Modeled as an enum so
//! the invariant "unauthenticated implies no subject and no
//! authorities" holds by construction rather than by discipline.

use std::collections::HashSet;
use std::fmt;

/// Authentication result for one request.
#[derive(Clone)]
pub enum AuthContext {
    /// No token was presented.
    Anonymous,

    /// A token was validated.
    Authenticated {
        /// Principal identifier (the token's subject claim).
        subject: String,

        /// Authorities derived from the token's role claims.
        authorities: HashSet<String>,
    },
}

impl AuthContext {
    /// Build an authenticated context.
    #[must_use]
    pub fn authenticated(subject: String, authorities: HashSet<String>) -> Self {
        AuthContext::Authenticated {
            subject,
            authorities,
        }
    }

    /// Whether a validated principal backs this context.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::Authenticated { .. })
    }

    /// The principal subject, if authenticated.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            AuthContext::Anonymous => None,
            AuthContext::Authenticated { subject, .. } => Some(subject),
        }
    }

    /// Whether the context holds the given authority. Always false for
    /// an anonymous context.
    #[must_use]
    pub fn has_authority(&self, authority: &str) -> bool {
        match self {
            AuthContext::Anonymous => false,
            AuthContext::Authenticated { authorities, .. } => authorities.contains(authority),
        }
    }

    /// Iterate the held authorities (empty for anonymous contexts).
    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        match self {
            AuthContext::Anonymous => None,
            AuthContext::Authenticated { authorities, .. } => Some(authorities),
        }
        .into_iter()
        .flatten()
        .map(String::as_str)
    }
}

/// Custom Debug implementation that redacts the subject.
impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthContext::Anonymous => f.debug_struct("Anonymous").finish(),
            AuthContext::Authenticated { authorities, .. } => f
                .debug_struct("Authenticated")
                .field("subject", &"[REDACTED]")
                .field("authorities", authorities)
                .finish(),
        }
    }
}
