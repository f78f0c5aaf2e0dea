//! Authentication integration tests.
//!
//! End-to-end behavior of the protected endpoints against a mocked
//! issuer: unauthorized vs forbidden vs permitted, claim precedence,
//! principal echo and provider-outage classification.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use auth_test_utils::keys::TestKeypair;
use auth_test_utils::tokens::TokenBuilder;
use auth_test_utils::{issuer, JWKS_PATH};
use greeting_service::config::{Config, DEFAULT_AUDIENCE};
use greeting_service::middleware::AuthState;
use greeting_service::routes;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    OnceLock::new();

fn get_test_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            routes::init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Service instance bound to a local port, backed by a mocked issuer.
struct TestServer {
    addr: SocketAddr,
    mock_server: MockServer,
    keypair: TestKeypair,
}

impl TestServer {
    /// Spawn with a healthy issuer publishing one key.
    async fn spawn() -> Result<Self> {
        Self::spawn_with_vars(HashMap::new()).await
    }

    async fn spawn_with_vars(extra_vars: HashMap<String, String>) -> Result<Self> {
        let mock_server = MockServer::start().await;
        let keypair = TestKeypair::new(1, "test-key-01");
        issuer::mount_issuer(&mock_server, &[&keypair]).await;
        Self::spawn_against(mock_server, keypair, extra_vars).await
    }

    /// Spawn against a caller-prepared issuer mock.
    async fn spawn_against(
        mock_server: MockServer,
        keypair: TestKeypair,
        extra_vars: HashMap<String, String>,
    ) -> Result<Self> {
        let mut vars = HashMap::from([
            ("ISSUER_URL".to_string(), mock_server.uri()),
            ("JWT_CLOCK_SKEW_SECONDS".to_string(), "30".to_string()),
        ]);
        vars.extend(extra_vars);

        let config = Config::from_vars(&vars)?;
        let auth_state = Arc::new(AuthState::from_config(&config));
        let app = routes::build_routes(auth_state, get_test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            mock_server,
            keypair,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A token builder preloaded with the trusted issuer and audience.
    fn token(&self) -> TokenBuilder {
        TokenBuilder::new(&self.mock_server.uri()).audience(DEFAULT_AUDIENCE)
    }
}

#[tokio::test]
async fn greeting_without_token_is_unauthorized() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(server.url("/greeting/Ann")).await?;

    assert_eq!(response.status(), 401);
    let www_auth = response
        .headers()
        .get("www-authenticate")
        .expect("WWW-Authenticate header");
    assert!(www_auth.to_str()?.contains("Bearer realm=\"greeting-api\""));

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    Ok(())
}

#[tokio::test]
async fn greeting_with_realm_role_is_permitted() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server
        .token()
        .subject("abc-123")
        .realm_roles(&["user"])
        .sign(&server.keypair);

    let response = reqwest::Client::new()
        .get(server.url("/greeting/Ann"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body = response.text().await?;
    assert!(
        body.contains("Say Hello to Ann at"),
        "unexpected body: {body}"
    );
    Ok(())
}

#[tokio::test]
async fn greeting_with_token_lacking_roles_is_forbidden() -> Result<()> {
    let server = TestServer::spawn().await?;
    // Validly signed, correct issuer and audience, but no role claims
    let token = server.token().sign(&server.keypair);

    let response = reqwest::Client::new()
        .get(server.url("/greeting/Ann"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn greeting_with_flat_roles_claim_is_permitted() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.token().roles(&["user"]).sign(&server.keypair);

    let response = reqwest::Client::new()
        .get(server.url("/greeting/Ann"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
async fn realm_access_takes_precedence_over_flat_roles() -> Result<()> {
    let server = TestServer::spawn().await?;
    // Both role sources present: only realm_access must be used
    let token = server
        .token()
        .realm_roles(&["user"])
        .roles(&["admin"])
        .sign(&server.keypair);

    let response = reqwest::Client::new()
        .get(server.url("/me"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["authorities"], serde_json::json!(["ROLE_USER"]));
    Ok(())
}

#[tokio::test]
async fn me_echoes_the_principal_subject() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server
        .token()
        .subject("abc-123")
        .realm_roles(&["user"])
        .sign(&server.keypair);

    let response = reqwest::Client::new()
        .get(server.url("/me"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["sub"], "abc-123");
    Ok(())
}

#[tokio::test]
async fn me_without_token_is_unauthorized() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(server.url("/me")).await?;

    assert_eq!(response.status(), 401);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_unauthorized_with_generic_body() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server
        .token()
        .realm_roles(&["user"])
        .expires_in(-600)
        .sign(&server.keypair);

    let response = reqwest::Client::new()
        .get(server.url("/greeting/Ann"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    // The body must not reveal which check failed
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert_eq!(
        body["error"]["message"],
        "The access token is invalid or expired"
    );
    Ok(())
}

#[tokio::test]
async fn wrong_audience_is_unauthorized() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = TokenBuilder::new(&server.mock_server.uri())
        .audiences(&["account", "http://other-service"])
        .realm_roles(&["user"])
        .sign(&server.keypair);

    let response = reqwest::Client::new()
        .get(server.url("/greeting/Ann"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    Ok(())
}

#[tokio::test]
async fn untrusted_signature_is_unauthorized() -> Result<()> {
    let server = TestServer::spawn().await?;
    let untrusted = TestKeypair::new(9, "test-key-01");
    let token = TokenBuilder::new(&server.mock_server.uri())
        .audience(DEFAULT_AUDIENCE)
        .realm_roles(&["user"])
        .sign(&untrusted);

    let response = reqwest::Client::new()
        .get(server.url("/greeting/Ann"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    Ok(())
}

#[tokio::test]
async fn provider_outage_is_service_unavailable() -> Result<()> {
    let mock_server = MockServer::start().await;
    let keypair = TestKeypair::new(1, "test-key-01");
    issuer::mount_discovery(&mock_server).await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let token = TokenBuilder::new(&mock_server.uri())
        .audience(DEFAULT_AUDIENCE)
        .realm_roles(&["user"])
        .sign(&keypair);
    let server = TestServer::spawn_against(mock_server, keypair, HashMap::new()).await?;

    let response = reqwest::Client::new()
        .get(server.url("/greeting/Ann"))
        .bearer_auth(token)
        .send()
        .await?;

    // Provider down must not masquerade as a bad token
    assert_eq!(response.status(), 503);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}

#[tokio::test]
async fn default_deny_policy_closes_unmatched_paths() -> Result<()> {
    let server = TestServer::spawn_with_vars(HashMap::from([(
        "DEFAULT_POLICY".to_string(),
        "deny".to_string(),
    )]))
    .await?;

    // /health matches no rule; with a closed perimeter it is gone
    let response = reqwest::get(server.url("/health")).await?;
    assert_eq!(response.status(), 401);

    // An authenticated caller without a matching rule is forbidden
    let token = server
        .token()
        .realm_roles(&["user"])
        .sign(&server.keypair);
    let response = reqwest::Client::new()
        .get(server.url("/health"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(response.status(), 403);
    Ok(())
}

#[tokio::test]
async fn health_is_open_by_default() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(server.url("/health")).await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn metrics_endpoint_is_open() -> Result<()> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(server.url("/metrics")).await?;

    assert_eq!(response.status(), 200);
    Ok(())
}
