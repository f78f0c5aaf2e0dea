//! Authentication and authorization core for OIDC-protected services.
//!
//! This library validates externally-issued JWTs against a trusted
//! OpenID Connect issuer and turns them into an authorization decision:
//!
//! - [`jwks`] - key store that discovers and caches the issuer's
//!   published verification keys
//! - [`validator`] - token validator (signature + ordered claim checks)
//! - [`authorities`] - maps role claims to internal authority strings
//! - [`policy`] - ordered method/path rules gating access by authority
//! - [`context`] - the per-request authentication result
//!
//! The pipeline is: raw bearer token -> [`validator::TokenValidator`]
//! (backed by [`jwks::KeyStore`]) -> [`claims::Claims`] ->
//! [`authorities::AuthorityMapper`] -> [`context::AuthContext`] ->
//! [`policy::PolicyEngine`].

#![warn(clippy::pedantic)]

/// Module for the validation error taxonomy
pub mod error;

/// Module for raw token header parsing (size limits, kid/alg extraction)
pub mod token;

/// Module for the validated claim set
pub mod claims;

/// Module for the signing key store (discovery, caching, refresh)
pub mod jwks;

/// Module for the token validator and its claim-check chain
pub mod validator;

/// Module for mapping role claims to authority names
pub mod authorities;

/// Module for the path/method authorization policy engine
pub mod policy;

/// Module for the per-request authentication context
pub mod context;

pub use authorities::AuthorityMapper;
pub use claims::{Audience, Claims};
pub use context::AuthContext;
pub use error::AuthError;
pub use jwks::KeyStore;
pub use policy::{Decision, DefaultDecision, PolicyEngine, PolicyRule, Requirement};
pub use validator::{ClaimCheck, TokenValidator};
