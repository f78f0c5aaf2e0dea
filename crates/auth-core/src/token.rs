//! Raw token header parsing.
//!
//! Extracts the key id and algorithm from a JWT header without
//! verifying the signature. The token is size-checked BEFORE any
//! decoding so oversized input is rejected with minimal work.

use crate::error::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::Algorithm;

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical tokens are well under 4KB even with Keycloak's realm-role
/// payloads; anything larger is rejected before base64 decoding or any
/// cryptographic work to bound resource usage per request.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Algorithms accepted from the token header.
///
/// The header-asserted algorithm is only honored when it is on this
/// list; everything else (notably `none` and HMAC variants) is rejected
/// as malformed before any key material is touched.
pub const SUPPORTED_ALGORITHMS: [Algorithm; 2] = [Algorithm::RS256, Algorithm::EdDSA];

/// Parsed, unverified JWT header fields needed for key resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Key id used to select the verification key.
    pub kid: String,

    /// Signature algorithm asserted by the token.
    pub alg: Algorithm,
}

/// Parse the header of a compact-serialized JWT.
///
/// Performs, in order: size check, structural split into three parts,
/// base64url + JSON decode of the header, extraction of a non-empty
/// string `kid` and a supported `alg`.
///
/// # Errors
///
/// Returns [`AuthError::Malformed`] for every failure; the specific
/// reason is logged at debug level.
pub fn parse_header(token: &str) -> Result<TokenHeader, AuthError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "auth.token",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(AuthError::Malformed);
    }

    // Compact serialization: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "auth.token",
            parts = parts.len(),
            "Token rejected: not a three-part JWT"
        );
        return Err(AuthError::Malformed);
    }

    let header_part = parts.first().ok_or(AuthError::Malformed)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "auth.token", error = %e, "Failed to decode JWT header base64");
        AuthError::Malformed
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "auth.token", error = %e, "Failed to parse JWT header JSON");
        AuthError::Malformed
    })?;

    // Empty kid values are rejected outright
    let kid = header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            tracing::debug!(target: "auth.token", "Token rejected: missing or empty kid");
            AuthError::Malformed
        })?;

    let alg_name = header.get("alg").and_then(|v| v.as_str()).ok_or_else(|| {
        tracing::debug!(target: "auth.token", "Token rejected: missing alg");
        AuthError::Malformed
    })?;

    let alg: Algorithm = alg_name.parse().map_err(|_| {
        tracing::debug!(target: "auth.token", alg = %alg_name, "Token rejected: unknown algorithm");
        AuthError::Malformed
    })?;

    if !SUPPORTED_ALGORITHMS.contains(&alg) {
        tracing::debug!(target: "auth.token", alg = %alg_name, "Token rejected: unsupported algorithm");
        return Err(AuthError::Malformed);
    }

    Ok(TokenHeader { kid, alg })
}
