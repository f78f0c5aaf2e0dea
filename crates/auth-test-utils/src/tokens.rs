//! Signed test token construction.

use crate::keys::TestKeypair;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for signed test tokens.
///
/// Starts from a sensible valid token (subject `user-1`, issued now,
/// expiring in an hour, `iss` set to the given issuer) so tests only
/// state what they want to be wrong.
pub struct TokenBuilder {
    claims: Map<String, Value>,
}

impl TokenBuilder {
    /// Start a token for the given issuer.
    pub fn new(issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!("user-1"));
        claims.insert("iss".to_string(), json!(issuer));
        claims.insert("iat".to_string(), json!(now));
        claims.insert("exp".to_string(), json!(now + 3600));
        Self { claims }
    }

    /// Set the subject claim.
    #[must_use]
    pub fn subject(mut self, sub: &str) -> Self {
        self.claims.insert("sub".to_string(), json!(sub));
        self
    }

    /// Set a single-string audience claim.
    #[must_use]
    pub fn audience(mut self, aud: &str) -> Self {
        self.claims.insert("aud".to_string(), json!(aud));
        self
    }

    /// Set a list audience claim.
    #[must_use]
    pub fn audiences(mut self, auds: &[&str]) -> Self {
        self.claims.insert("aud".to_string(), json!(auds));
        self
    }

    /// Override the issuer claim.
    #[must_use]
    pub fn issuer(mut self, iss: &str) -> Self {
        self.claims.insert("iss".to_string(), json!(iss));
        self
    }

    /// Set `exp` relative to now; negative values produce an expired token.
    #[must_use]
    pub fn expires_in(mut self, seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        self.claims.insert("exp".to_string(), json!(now + seconds));
        self
    }

    /// Set `nbf` relative to now; positive values produce a not-yet-valid token.
    #[must_use]
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        self.claims.insert("nbf".to_string(), json!(now + seconds));
        self
    }

    /// Set Keycloak-style realm roles (`realm_access.roles`).
    #[must_use]
    pub fn realm_roles(mut self, roles: &[&str]) -> Self {
        self.claims
            .insert("realm_access".to_string(), json!({ "roles": roles }));
        self
    }

    /// Set a flat `roles` claim.
    #[must_use]
    pub fn roles(mut self, roles: &[&str]) -> Self {
        self.claims.insert("roles".to_string(), json!(roles));
        self
    }

    /// Set an arbitrary claim.
    #[must_use]
    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Sign the token with the given keypair (EdDSA, kid from the keypair).
    pub fn sign(&self, keypair: &TestKeypair) -> String {
        let encoding_key = EncodingKey::from_ed_der(keypair.private_key_pkcs8());
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());
        header.kid = Some(keypair.kid.clone());

        encode(&header, &self.claims, &encoding_key).expect("Failed to sign token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn decode_payload(token: &str) -> Value {
        let payload = token.split('.').nth(1).expect("payload part");
        let bytes = URL_SAFE_NO_PAD.decode(payload).expect("valid base64url");
        serde_json::from_slice(&bytes).expect("valid JSON")
    }

    #[test]
    fn test_defaults_produce_valid_claims() {
        let keypair = TestKeypair::new(1, "key-01");
        let token = TokenBuilder::new("https://idp.example.com/realms/demo").sign(&keypair);

        let payload = decode_payload(&token);
        assert_eq!(payload["sub"], "user-1");
        assert_eq!(payload["iss"], "https://idp.example.com/realms/demo");
        assert!(payload["exp"].as_i64().expect("exp") > chrono::Utc::now().timestamp());
    }

    #[test]
    fn test_header_carries_kid_and_alg() {
        let keypair = TestKeypair::new(1, "key-01");
        let token = TokenBuilder::new("https://idp.example.com/realms/demo").sign(&keypair);

        let header_part = token.split('.').next().expect("header part");
        let bytes = URL_SAFE_NO_PAD.decode(header_part).expect("valid base64url");
        let header: Value = serde_json::from_slice(&bytes).expect("valid JSON");

        assert_eq!(header["kid"], "key-01");
        assert_eq!(header["alg"], "EdDSA");
    }

    #[test]
    fn test_realm_roles_shape() {
        let keypair = TestKeypair::new(1, "key-01");
        let token = TokenBuilder::new("https://idp.example.com/realms/demo")
            .realm_roles(&["user", "admin"])
            .sign(&keypair);

        let payload = decode_payload(&token);
        assert_eq!(payload["realm_access"]["roles"], json!(["user", "admin"]));
    }

    #[test]
    fn test_expires_in_past() {
        let keypair = TestKeypair::new(1, "key-01");
        let token = TokenBuilder::new("https://idp.example.com/realms/demo")
            .expires_in(-600)
            .sign(&keypair);

        let payload = decode_payload(&token);
        assert!(payload["exp"].as_i64().expect("exp") < chrono::Utc::now().timestamp());
    }
}
