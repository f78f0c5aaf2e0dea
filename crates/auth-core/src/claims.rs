//! Validated token claim set.
//!
//! Registered claims are typed; everything else the provider puts in
//! the payload (Keycloak's `realm_access` structure, flat role lists,
//! arbitrary extensions) is kept as loosely structured JSON so
//! consumers can pattern-match on the actual shape instead of casting.
//! The `sub` field is redacted in Debug output to keep principal
//! identifiers out of logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `aud` claim: a single audience string or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience value.
    One(String),

    /// Multiple audience values.
    Many(Vec<String>),
}

impl Audience {
    /// Whether this audience claim contains `expected`.
    #[must_use]
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::One(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// Claims extracted from a validated token.
///
/// Created fresh per validated token and discarded at the end of the
/// request. Provider-specific claims live in `extra` as raw JSON.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal identifier) - redacted in Debug output.
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience(s) the token was issued for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// All remaining claims, untyped.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// Look up a non-registered claim by name.
    ///
    /// Returns `None` when the claim is absent; the caller owns
    /// deciding what any particular JSON shape means.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.extra.get(name)
    }
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("nbf", &self.nbf)
            .field("iat", &self.iat)
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}
