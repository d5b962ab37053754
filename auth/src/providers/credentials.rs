//! Credential verification trait.
//!
//! Login itself belongs to an external identity service; the gate only needs
//! to know whether a username/password pair is accepted and which identity it
//! maps to.

use crate::error::Result;
use crate::state::Credentials;
use async_trait::async_trait;
use data_citation_core::UserId;

/// Verifies login credentials.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check credentials and return the identity they belong to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for unknown users or wrong
    /// passwords (indistinguishably).
    async fn verify(&self, credentials: &Credentials) -> Result<UserId>;
}
