//! Deterministic Ed25519 keypairs for test token signing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ring::signature::{Ed25519KeyPair, KeyPair};

/// Test keypair for signing tokens and publishing the matching JWK.
pub struct TestKeypair {
    /// Key id published in the JWK and asserted in token headers.
    pub kid: String,
    public_key_bytes: Vec<u8>,
    private_key_pkcs8: Vec<u8>,
}

impl TestKeypair {
    /// Create a deterministic keypair from a seed byte.
    ///
    /// Two keypairs with different seeds never verify each other's
    /// signatures, which is what untrusted-key tests need.
    pub fn new(seed: u8, kid: &str) -> Self {
        let mut seed_bytes = [0u8; 32];
        seed_bytes[0] = seed;
        for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
            *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
        }

        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
            .expect("Failed to create test keypair");

        Self {
            kid: kid.to_string(),
            public_key_bytes: key_pair.public_key().as_ref().to_vec(),
            private_key_pkcs8: build_pkcs8_from_seed(&seed_bytes),
        }
    }

    /// PKCS#8 document for `jsonwebtoken`'s `EncodingKey::from_ed_der`.
    pub fn private_key_pkcs8(&self) -> &[u8] {
        &self.private_key_pkcs8
    }

    /// The JWK this keypair would appear as in the issuer's key set.
    pub fn jwk(&self) -> serde_json::Value {
        serde_json::json!({
            "kty": "OKP",
            "kid": self.kid,
            "crv": "Ed25519",
            "x": URL_SAFE_NO_PAD.encode(&self.public_key_bytes),
            "alg": "EdDSA",
            "use": "sig"
        })
    }
}

/// Build a PKCS#8 v1 document from an Ed25519 seed.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    let mut pkcs8 = Vec::new();

    // Outer SEQUENCE tag
    pkcs8.push(0x30);
    pkcs8.push(0x2e); // Length: 46 bytes

    // Version: INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);

    // Algorithm Identifier: SEQUENCE
    pkcs8.push(0x30);
    pkcs8.push(0x05); // Length: 5 bytes
                      // OID for Ed25519: 1.3.101.112
    pkcs8.extend_from_slice(&[0x06, 0x03, 0x2b, 0x65, 0x70]);

    // Private Key: OCTET STRING
    pkcs8.push(0x04);
    pkcs8.push(0x22); // Length: 34 bytes
                      // Inner OCTET STRING with seed
    pkcs8.push(0x04);
    pkcs8.push(0x20); // Length: 32 bytes
    pkcs8.extend_from_slice(seed);

    pkcs8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypairs_are_deterministic() {
        let a = TestKeypair::new(1, "key-01");
        let b = TestKeypair::new(1, "key-01");

        assert_eq!(a.public_key_bytes, b.public_key_bytes);
        assert_eq!(a.private_key_pkcs8, b.private_key_pkcs8);
    }

    #[test]
    fn test_different_seeds_give_different_keys() {
        let a = TestKeypair::new(1, "key-01");
        let b = TestKeypair::new(2, "key-01");

        assert_ne!(a.public_key_bytes, b.public_key_bytes);
    }

    #[test]
    fn test_jwk_shape() {
        let keypair = TestKeypair::new(1, "key-01");
        let jwk = keypair.jwk();

        assert_eq!(jwk["kty"], "OKP");
        assert_eq!(jwk["kid"], "key-01");
        assert_eq!(jwk["alg"], "EdDSA");
        assert_eq!(jwk["use"], "sig");

        let x = jwk["x"].as_str().expect("x field");
        let decoded = URL_SAFE_NO_PAD.decode(x).expect("valid base64url");
        assert_eq!(decoded.len(), 32, "Ed25519 public key is 32 bytes");
    }
}
