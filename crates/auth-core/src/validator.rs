//! Token validation.
//!
//! Validates incoming JWTs against keys resolved from the issuer's
//! published set, then runs an ordered chain of claim checks. The
//! checks are independent [`ClaimCheck`] implementations so individual
//! requirements (audience in particular) can be swapped or disabled
//! without touching signature or decoding logic.
//!
//! Check order is deterministic and short-circuits on the first
//! failure: decode -> key lookup -> signature -> expiry -> not-before
//! -> issuer -> audience.

use crate::claims::Claims;
use crate::error::AuthError;
use crate::jwks::{KeyStore, SigningKey};
use crate::token::parse_header;
use jsonwebtoken::{decode, errors::ErrorKind, Validation};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

/// Default clock skew tolerance in seconds (5 minutes).
pub const DEFAULT_CLOCK_SKEW_SECONDS: i64 = 300;

/// Maximum allowed clock skew tolerance in seconds (10 minutes).
///
/// Guards against misconfiguration that would weaken temporal checks.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 600;

/// A single claim requirement, applied after signature verification.
///
/// Checks run in the order they are registered and short-circuit on
/// the first failure.
pub trait ClaimCheck: Send + Sync {
    /// Stable name for logging.
    fn name(&self) -> &'static str;

    /// Verify the requirement against a signature-verified claim set.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] kind specific to this requirement.
    fn check(&self, claims: &Claims) -> Result<(), AuthError>;
}

/// Rejects tokens whose `exp` is in the past.
pub struct ExpiryCheck {
    /// Clock skew tolerance in seconds.
    pub leeway: i64,
}

impl ExpiryCheck {
    /// Deterministic variant against an explicit `now`, for boundary tests.
    fn check_at(&self, claims: &Claims, now: i64) -> Result<(), AuthError> {
        if now > claims.exp + self.leeway {
            return Err(AuthError::Expired);
        }
        Ok(())
    }
}

impl ClaimCheck for ExpiryCheck {
    fn name(&self) -> &'static str {
        "expiry"
    }

    fn check(&self, claims: &Claims) -> Result<(), AuthError> {
        self.check_at(claims, chrono::Utc::now().timestamp())
    }
}

/// Rejects tokens whose `nbf` is in the future. Tokens without an
/// `nbf` claim pass.
pub struct NotBeforeCheck {
    /// Clock skew tolerance in seconds.
    pub leeway: i64,
}

impl NotBeforeCheck {
    fn check_at(&self, claims: &Claims, now: i64) -> Result<(), AuthError> {
        if let Some(nbf) = claims.nbf {
            if nbf - self.leeway > now {
                return Err(AuthError::NotYetValid);
            }
        }
        Ok(())
    }
}

impl ClaimCheck for NotBeforeCheck {
    fn name(&self) -> &'static str {
        "not_before"
    }

    fn check(&self, claims: &Claims) -> Result<(), AuthError> {
        self.check_at(claims, chrono::Utc::now().timestamp())
    }
}

/// Requires the `iss` claim to equal the trusted issuer exactly.
pub struct IssuerCheck {
    /// Trusted issuer URL.
    pub expected: String,
}

impl ClaimCheck for IssuerCheck {
    fn name(&self) -> &'static str {
        "issuer"
    }

    fn check(&self, claims: &Claims) -> Result<(), AuthError> {
        if claims.iss.as_deref() == Some(self.expected.as_str()) {
            Ok(())
        } else {
            Err(AuthError::BadIssuer)
        }
    }
}

/// Requires the `aud` claim to contain the expected audience.
pub struct AudienceCheck {
    /// Audience value this service accepts tokens for.
    pub expected: String,
}

impl ClaimCheck for AudienceCheck {
    fn name(&self) -> &'static str {
        "audience"
    }

    fn check(&self, claims: &Claims) -> Result<(), AuthError> {
        match &claims.aud {
            Some(aud) if aud.contains(&self.expected) => Ok(()),
            _ => Err(AuthError::BadAudience),
        }
    }
}

/// JWT validator backed by a [`KeyStore`].
///
/// Keys are only ever resolved for the configured trusted issuer; a
/// token asserting some other issuer fails signature verification (its
/// signer is not in our set) or the issuer check, and can never steer
/// the store toward an attacker-controlled URL.
pub struct TokenValidator {
    key_store: Arc<KeyStore>,
    issuer: String,
    checks: Vec<Box<dyn ClaimCheck>>,
}

impl TokenValidator {
    /// Create a validator with the standard check chain:
    /// expiry, not-before, issuer equality, audience containment.
    #[must_use]
    pub fn new(key_store: Arc<KeyStore>, issuer: String, audience: String, leeway: i64) -> Self {
        let checks: Vec<Box<dyn ClaimCheck>> = vec![
            Box::new(ExpiryCheck { leeway }),
            Box::new(NotBeforeCheck { leeway }),
            Box::new(IssuerCheck {
                expected: issuer.clone(),
            }),
            Box::new(AudienceCheck { expected: audience }),
        ];
        Self::with_checks(key_store, issuer, checks)
    }

    /// Create a validator with a custom check chain.
    ///
    /// Checks run in the given order after signature verification.
    #[must_use]
    pub fn with_checks(
        key_store: Arc<KeyStore>,
        issuer: String,
        checks: Vec<Box<dyn ClaimCheck>>,
    ) -> Self {
        Self {
            key_store,
            issuer,
            checks,
        }
    }

    /// The issuer this validator trusts.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Validate a bearer token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the specific [`AuthError`] kind of the first failing
    /// step; callers collapse these into a single client-facing
    /// rejection and keep the kind for logs/metrics.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let header = parse_header(token)?;

        let key = self.key_store.resolve(&self.issuer, &header.kid).await?;

        let claims = verify_signature(token, &key, header.alg)?;

        for check in &self.checks {
            if let Err(err) = check.check(&claims) {
                tracing::debug!(
                    target: "auth.validator",
                    check = check.name(),
                    kind = err.kind(),
                    "Claim check failed"
                );
                return Err(err);
            }
        }

        tracing::debug!(target: "auth.validator", "Token validated successfully");
        Ok(claims)
    }
}

/// Verify the token signature and deserialize its claims.
///
/// Registered-claim validation is disabled here; the [`ClaimCheck`]
/// chain owns temporal, issuer and audience requirements so their
/// order and failure kinds stay deterministic.
fn verify_signature(
    token: &str,
    key: &SigningKey,
    asserted_alg: jsonwebtoken::Algorithm,
) -> Result<Claims, AuthError> {
    if key.algorithm != asserted_alg {
        tracing::warn!(
            target: "auth.validator",
            kid = %key.kid,
            asserted = ?asserted_alg,
            published = ?key.algorithm,
            "Token algorithm does not match published key"
        );
        return Err(AuthError::BadSignature);
    }

    let mut validation = Validation::new(asserted_alg);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    let token_data =
        decode::<Claims>(token, key.decoding_key(), &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => {
                tracing::debug!(target: "auth.validator", "Signature verification failed");
                AuthError::BadSignature
            }
            ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_)
            | ErrorKind::InvalidToken => {
                tracing::debug!(target: "auth.validator", error = %e, "Token payload malformed");
                AuthError::Malformed
            }
            _ => {
                tracing::debug!(target: "auth.validator", error = %e, "Token verification failed");
                AuthError::BadSignature
            }
        })?;

    Ok(token_data.claims)
}
