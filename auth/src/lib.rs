//! # Data Citation Auth
//!
//! Session-based access gate for the citation request processor.
//!
//! Callers log in with a username and password, receive an opaque bearer
//! token (the session id) and present it on every subsequent call. The gate
//! resolves the token to a [`Session`] whose
//! [`UserId`](data_citation_core::UserId) the processor uses for ownership
//! checks.
//!
//! ## Architecture
//!
//! - [`AccessGate`]: login / authorize / logout
//! - [`SessionStore`]: where sessions live ([`InMemorySessionStore`])
//! - [`CredentialVerifier`]: who may log in ([`StaticCredentialVerifier`])
//!
//! Expiry is evaluated against the injected [`Clock`](data_citation_core::Clock)
//! so tests can drive time explicitly.
//!
//! ## Example
//!
//! ```
//! use data_citation_auth::{
//!     AccessGate, Credentials, InMemorySessionStore, SessionConfig, StaticCredentialVerifier,
//! };
//! use data_citation_core::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> data_citation_auth::Result<()> {
//! let gate = AccessGate::new(
//!     Arc::new(InMemorySessionStore::new()),
//!     Arc::new(StaticCredentialVerifier::parse("alice:secret")?),
//!     Arc::new(SystemClock),
//!     SessionConfig::default(),
//! );
//!
//! let session = gate.login(&Credentials::new("alice", "secret")).await?;
//! let current = gate.authorize(&session.session_id.to_string()).await?;
//! assert_eq!(current.user_id.as_str(), "alice");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod providers;
pub mod state;
pub mod stores;

pub use config::SessionConfig;
pub use error::{AuthError, Result};
pub use gate::AccessGate;
pub use providers::{CredentialVerifier, SessionStore};
pub use state::{Credentials, Session, SessionId};
pub use stores::{InMemorySessionStore, StaticCredentialVerifier};
