//! Greeting Service Library
//!
//! An OIDC resource server: every request passes through the
//! authentication middleware, which validates bearer tokens against
//! the trusted issuer (via `auth-core`), derives authorities from role
//! claims and consults the path policy before dispatch.
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication/authorization middleware
//! - `observability` - Metrics definitions
//! - `routes` - Axum router setup

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
