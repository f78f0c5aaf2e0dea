//! Middleware for the greeting service.
//!
//! # Components
//!
//! - `auth` - Authentication and authorization middleware applied to
//!   every API route

pub mod auth;

pub use auth::{authenticate, AuthState};
