//! # Auth Test Utilities
//!
//! Shared test utilities for exercising the token validation pipeline
//! without a real identity provider:
//!
//! - [`keys::TestKeypair`] - deterministic Ed25519 keypairs for signing
//!   test tokens and publishing matching JWKs
//! - [`tokens::TokenBuilder`] - claim construction for signed tokens
//! - [`issuer`] - wiremock mounts for the OIDC discovery document and
//!   the key-set endpoint
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::{issuer, keys::TestKeypair, tokens::TokenBuilder};
//! use wiremock::MockServer;
//!
//! let server = MockServer::start().await;
//! let keypair = TestKeypair::new(1, "test-key-01");
//! issuer::mount_issuer(&server, &[&keypair]).await;
//!
//! let token = TokenBuilder::new(&server.uri())
//!     .subject("abc-123")
//!     .audience("http://demo-service")
//!     .realm_roles(&["user"])
//!     .sign(&keypair);
//! ```

pub mod issuer;
pub mod keys;
pub mod tokens;

pub use issuer::{jwks_document, mount_issuer, DISCOVERY_PATH, JWKS_PATH};
pub use keys::TestKeypair;
pub use tokens::TokenBuilder;
