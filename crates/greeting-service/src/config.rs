//! Greeting service configuration.
//!
//! Configuration is loaded from environment variables with sensible
//! defaults; only the trusted issuer URL is required.

use auth_core::jwks::DEFAULT_CACHE_TTL_SECONDS;
use auth_core::policy::DefaultDecision;
use auth_core::validator::{DEFAULT_CLOCK_SKEW_SECONDS, MAX_CLOCK_SKEW_SECONDS};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default audience required in accepted tokens.
pub const DEFAULT_AUDIENCE: &str = "http://demo-service";

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default authority prefix for mapped roles.
pub const DEFAULT_AUTHORITY_PREFIX: &str = "ROLE_";

/// Default role-claim precedence, comma separated.
pub const DEFAULT_ROLE_CLAIM_PATHS: &str = "realm_access.roles,roles";

/// Greeting service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Trusted token issuer URL (OIDC discovery root).
    pub issuer_url: String,

    /// Audience value required in accepted tokens.
    pub audience: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Prefix prepended to mapped role names.
    pub authority_prefix: String,

    /// Ordered role-claim paths, first list wins.
    pub role_claim_paths: Vec<String>,

    /// JWT clock skew tolerance in seconds for temporal claims.
    pub jwt_clock_skew_seconds: i64,

    /// TTL for the cached issuer key set, in seconds.
    pub jwks_cache_ttl_seconds: u64,

    /// What happens to requests matching no policy rule.
    ///
    /// Shipped default is permit (open perimeter); this is an explicit
    /// choice for the system owner, not an implicit fallback.
    pub default_policy: DefaultDecision,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid key cache TTL configuration: {0}")]
    InvalidCacheTtl(String),

    #[error("Invalid default policy configuration: {0}")]
    InvalidDefaultPolicy(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value fails validation.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let issuer_url = vars
            .get("ISSUER_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("ISSUER_URL".to_string()))?
            .clone();

        let audience = vars
            .get("AUDIENCE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let authority_prefix = vars
            .get("AUTHORITY_PREFIX")
            .cloned()
            .unwrap_or_else(|| DEFAULT_AUTHORITY_PREFIX.to_string());

        let role_claim_paths: Vec<String> = vars
            .get("ROLE_CLAIM_PATHS")
            .map_or(DEFAULT_ROLE_CLAIM_PATHS, String::as_str)
            .split(',')
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(ToString::to_string)
            .collect();

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{value_str}': {e}"
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {value}"
                )));
            }

            if value > MAX_CLOCK_SKEW_SECONDS {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {MAX_CLOCK_SKEW_SECONDS} seconds, got {value}"
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW_SECONDS
        };

        // Parse key cache TTL with validation
        let jwks_cache_ttl_seconds = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidCacheTtl(
                    "JWKS_CACHE_TTL_SECONDS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_CACHE_TTL_SECONDS
        };

        let default_policy = match vars.get("DEFAULT_POLICY").map(String::as_str) {
            None => DefaultDecision::Permit,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "permit" => DefaultDecision::Permit,
                "deny" => DefaultDecision::Deny,
                other => {
                    return Err(ConfigError::InvalidDefaultPolicy(format!(
                        "DEFAULT_POLICY must be 'permit' or 'deny', got '{other}'"
                    )))
                }
            },
        };

        Ok(Config {
            issuer_url,
            audience,
            bind_address,
            authority_prefix,
            role_claim_paths,
            jwt_clock_skew_seconds,
            jwks_cache_ttl_seconds,
            default_policy,
        })
    }
}
