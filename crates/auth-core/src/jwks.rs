//! Signing key store.
//!
//! Discovers the issuer's key-publication endpoint from its OIDC
//! metadata, fetches the published key set and caches it per issuer
//! with a configurable TTL.
//!
//! # Security
//!
//! - Keys are cached to reduce load on the provider and improve latency
//! - A lookup for an unknown key id triggers exactly one refresh-and-retry
//!   (handles key rotation without unbounded refresh loops)
//! - Concurrent refreshes for the same issuer coalesce into one fetch
//! - All outbound calls are bounded by a client timeout
//!
//! The cached set is immutable: a refresh installs a whole new
//! [`KeySet`] behind the lock, so in-flight readers never observe a
//! partially updated map.

use crate::error::AuthError;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Timeout for discovery and key-set fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON Web Key as published by the issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" or "OKP").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm (e.g. "RS256", "EdDSA").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use ("sig" for signing; encryption keys are skipped).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Curve name for OKP keys (always "Ed25519" here).
    #[serde(default)]
    pub crv: Option<String>,

    /// OKP public key value (base64url encoded).
    #[serde(default)]
    pub x: Option<String>,
}

/// Key-set response from the issuer's JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// The subset of the OIDC discovery document we need.
#[derive(Debug, Clone, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

/// A verification key resolved from the issuer's published set.
#[derive(Clone)]
pub struct SigningKey {
    /// Key id this key was published under.
    pub kid: String,

    /// Algorithm the key verifies.
    pub algorithm: Algorithm,

    key: Arc<DecodingKey>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("key", &"<opaque>")
            .finish()
    }
}

impl SigningKey {
    /// The verification key material.
    #[must_use]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    /// Build a verification key from a published JWK.
    ///
    /// Returns `None` for keys this service cannot use (encryption
    /// keys, unknown key types, unusable material); a bad entry in the
    /// published set must not poison the whole set.
    fn from_jwk(jwk: &Jwk) -> Option<Self> {
        if let Some(key_use) = &jwk.key_use {
            if key_use != "sig" {
                tracing::debug!(target: "auth.jwks", kid = %jwk.kid, key_use = %key_use, "Skipping non-signature key");
                return None;
            }
        }

        let (algorithm, key) = match jwk.kty.as_str() {
            "RSA" => {
                let n = jwk.n.as_deref()?;
                let e = jwk.e.as_deref()?;
                let key = DecodingKey::from_rsa_components(n, e)
                    .map_err(|err| {
                        tracing::warn!(target: "auth.jwks", kid = %jwk.kid, error = %err, "Unusable RSA key in JWKS");
                    })
                    .ok()?;
                let algorithm = match jwk.alg.as_deref() {
                    None | Some("RS256") => Algorithm::RS256,
                    Some(other) => {
                        tracing::debug!(target: "auth.jwks", kid = %jwk.kid, alg = %other, "Skipping RSA key with unsupported algorithm");
                        return None;
                    }
                };
                (algorithm, key)
            }
            "OKP" => {
                let x = jwk.x.as_deref()?;
                let key = DecodingKey::from_ed_components(x)
                    .map_err(|err| {
                        tracing::warn!(target: "auth.jwks", kid = %jwk.kid, error = %err, "Unusable Ed25519 key in JWKS");
                    })
                    .ok()?;
                (Algorithm::EdDSA, key)
            }
            other => {
                tracing::debug!(target: "auth.jwks", kid = %jwk.kid, kty = %other, "Skipping key with unknown type");
                return None;
            }
        };

        Some(SigningKey {
            kid: jwk.kid.clone(),
            algorithm,
            key: Arc::new(key),
        })
    }
}

/// An immutable snapshot of one issuer's published keys.
pub struct KeySet {
    keys: HashMap<String, SigningKey>,
    fetched_at: Instant,
}

impl KeySet {
    fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }

    /// Number of usable keys in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the snapshot holds no usable keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Per-issuer cache state.
struct IssuerEntry {
    issuer: String,

    /// Discovered key-endpoint URL; only set on successful discovery so
    /// a failed discovery is retried on the next use.
    jwks_uri: OnceCell<String>,

    /// Current key-set snapshot, replaced wholesale on refresh.
    current: RwLock<Option<Arc<KeySet>>>,

    /// Serializes refreshes so concurrent misses coalesce into one fetch.
    refresh: Mutex<()>,
}

/// Key store resolving `(issuer, kid)` to a verification key.
///
/// Owns the HTTP client and the per-issuer caches. Constructed once at
/// startup and shared by handle so tests can substitute the issuer.
pub struct KeyStore {
    http: reqwest::Client,
    cache_ttl: Duration,
    issuers: std::sync::Mutex<HashMap<String, Arc<IssuerEntry>>>,
}

impl KeyStore {
    /// Create a key store with the default cache TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }

    /// Create a key store with a custom cache TTL.
    #[must_use]
    pub fn with_ttl(cache_ttl: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            http,
            cache_ttl,
            issuers: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a verification key for `kid` as published by `issuer`.
    ///
    /// Serves from the cached set when it is fresh and contains the
    /// key; otherwise refreshes the set exactly once and retries the
    /// lookup. Concurrent callers share a single in-flight refresh.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyStoreUnavailable`] when discovery or the
    /// key fetch fails, and [`AuthError::KeyNotFound`] when the key id
    /// is absent even from a freshly fetched set.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn resolve(&self, issuer: &str, kid: &str) -> Result<SigningKey, AuthError> {
        let entry = self.entry(issuer);
        let observed = Instant::now();

        // Fast path: fresh cached set containing the key
        {
            let current = entry.current.read().await;
            if let Some(set) = current.as_ref() {
                if set.is_fresh(self.cache_ttl) {
                    if let Some(key) = set.get(kid) {
                        tracing::debug!(target: "auth.jwks", "Key cache hit");
                        return Ok(key.clone());
                    }
                }
            }
        }

        // Slow path: the set is stale or lacks the key. Coalesce with
        // any concurrent refresh for this issuer.
        let _guard = entry.refresh.lock().await;

        // A refresh that completed while we waited for the lock counts
        // as ours; only fetch if the snapshot predates our miss.
        let refreshed_behind_us = {
            let current = entry.current.read().await;
            match current.as_ref() {
                Some(set) if set.fetched_at > observed => Some(Arc::clone(set)),
                _ => None,
            }
        };

        let set = match refreshed_behind_us {
            Some(set) => set,
            None => self.refresh(&entry).await?,
        };

        set.get(kid).cloned().ok_or_else(|| {
            tracing::warn!(target: "auth.jwks", kid = %kid, "Key not found in key set after refresh");
            AuthError::KeyNotFound
        })
    }

    /// Get or create the cache entry for an issuer.
    fn entry(&self, issuer: &str) -> Arc<IssuerEntry> {
        let mut issuers = self
            .issuers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(issuers.entry(issuer.to_string()).or_insert_with(|| {
            Arc::new(IssuerEntry {
                issuer: issuer.to_string(),
                jwks_uri: OnceCell::new(),
                current: RwLock::new(None),
                refresh: Mutex::new(()),
            })
        }))
    }

    /// Fetch a fresh key set for the issuer and install it.
    ///
    /// Caller must hold the entry's refresh lock.
    async fn refresh(&self, entry: &IssuerEntry) -> Result<Arc<KeySet>, AuthError> {
        let jwks_uri = entry
            .jwks_uri
            .get_or_try_init(|| self.discover(&entry.issuer))
            .await?
            .clone();

        tracing::debug!(target: "auth.jwks", url = %jwks_uri, "Fetching key set from issuer");

        let response = self.http.get(&jwks_uri).send().await.map_err(|e| {
            tracing::error!(target: "auth.jwks", error = %e, "Failed to fetch key set");
            AuthError::KeyStoreUnavailable
        })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "auth.jwks",
                status = %response.status(),
                "Key endpoint returned error"
            );
            return Err(AuthError::KeyStoreUnavailable);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "auth.jwks", error = %e, "Failed to parse key set response");
            AuthError::KeyStoreUnavailable
        })?;

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            if let Some(key) = SigningKey::from_jwk(jwk) {
                keys.insert(key.kid.clone(), key);
            }
        }

        tracing::info!(
            target: "auth.jwks",
            issuer = %entry.issuer,
            key_count = keys.len(),
            "Key set refreshed"
        );

        let set = Arc::new(KeySet {
            keys,
            fetched_at: Instant::now(),
        });

        let mut current = entry.current.write().await;
        *current = Some(Arc::clone(&set));

        Ok(set)
    }

    /// Fetch the issuer's OIDC metadata to learn its key endpoint.
    async fn discover(&self, issuer: &str) -> Result<String, AuthError> {
        let url = format!(
            "{}/.well-known/openid-configuration",
            issuer.trim_end_matches('/')
        );

        tracing::debug!(target: "auth.jwks", url = %url, "Fetching issuer metadata");

        let response = self.http.get(&url).send().await.map_err(|e| {
            tracing::error!(target: "auth.jwks", error = %e, "Failed to fetch issuer metadata");
            AuthError::KeyStoreUnavailable
        })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "auth.jwks",
                status = %response.status(),
                "Discovery endpoint returned error"
            );
            return Err(AuthError::KeyStoreUnavailable);
        }

        let document: DiscoveryDocument = response.json().await.map_err(|e| {
            tracing::error!(target: "auth.jwks", error = %e, "Failed to parse issuer metadata");
            AuthError::KeyStoreUnavailable
        })?;

        tracing::info!(
            target: "auth.jwks",
            issuer = %issuer,
            jwks_uri = %document.jwks_uri,
            "Issuer metadata discovered"
        );

        Ok(document.jwks_uri)
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}
