//! HTTP request handlers.
//!
//! Organized by concern: liveness/readiness, session lifecycle and citation
//! requests.

pub mod auth;
pub mod citation;
pub mod health;

pub use health::health_check;
