//! Data citation server.
//!
//! Configuration loading and service wiring live here so they can be tested
//! without starting a listener; `main.rs` only owns the process lifecycle.

pub mod app;
pub mod config;

pub use app::CitationApp;
pub use config::Config;
