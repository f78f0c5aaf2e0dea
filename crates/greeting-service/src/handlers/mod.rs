//! HTTP request handlers for the greeting service.

pub mod greeting;
pub mod health;
pub mod me;
pub mod metrics;

pub use greeting::greeting;
pub use health::health_check;
pub use me::current_user;
pub use metrics::metrics_handler;
