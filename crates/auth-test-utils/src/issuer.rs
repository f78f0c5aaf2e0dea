//! Mock issuer endpoints.
//!
//! Mounts the two endpoints the key store talks to on a wiremock
//! server: the OIDC discovery document and the key-set endpoint. Paths
//! follow Keycloak's layout so the mock reads like the real provider.

use crate::keys::TestKeypair;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Discovery document path relative to the issuer URL.
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// Key-set path relative to the issuer URL (Keycloak layout).
pub const JWKS_PATH: &str = "/protocol/openid-connect/certs";

/// The discovery document for an issuer rooted at `issuer_url`.
pub fn discovery_document(issuer_url: &str) -> serde_json::Value {
    json!({
        "issuer": issuer_url,
        "jwks_uri": format!("{issuer_url}{JWKS_PATH}"),
    })
}

/// The key-set document publishing the given keypairs.
pub fn jwks_document(keypairs: &[&TestKeypair]) -> serde_json::Value {
    json!({
        "keys": keypairs.iter().map(|kp| kp.jwk()).collect::<Vec<_>>(),
    })
}

/// Mount discovery and key-set endpoints publishing `keypairs`.
pub async fn mount_issuer(server: &MockServer, keypairs: &[&TestKeypair]) {
    mount_discovery(server).await;
    mount_jwks(server, keypairs).await;
}

/// Mount only the discovery document.
pub async fn mount_discovery(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_document(&server.uri())))
        .mount(server)
        .await;
}

/// Mount only the key-set endpoint.
pub async fn mount_jwks(server: &MockServer, keypairs: &[&TestKeypair]) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_document(keypairs)))
        .mount(server)
        .await;
}
