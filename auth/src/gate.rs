//! The access gate.
//!
//! Every processor operation passes a bearer token through [`AccessGate::authorize`]
//! before touching request state. Login and logout are delegated to the
//! configured [`CredentialVerifier`] and [`SessionStore`].

use crate::config::SessionConfig;
use crate::error::{AuthError, Result};
use crate::providers::{CredentialVerifier, SessionStore};
use crate::state::{Credentials, Session, SessionId};
use data_citation_core::Clock;
use std::sync::Arc;

/// Authenticates callers and resolves bearer tokens to identities.
#[derive(Clone)]
pub struct AccessGate {
    sessions: Arc<dyn SessionStore>,
    verifier: Arc<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    /// Create a gate over the given collaborators.
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        verifier: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            sessions,
            verifier,
            clock,
            config,
        }
    }

    /// Session configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Verify credentials and open a session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] if the verifier rejects them
    /// - [`AuthError::StoreError`] if the session cannot be stored
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let user_id = self.verifier.verify(credentials).await?;

        let now = self.clock.now();
        let session = Session {
            session_id: SessionId::new(),
            user_id,
            created_at: now,
            last_active: now,
            expires_at: self.config.expiry_from(now),
        };

        self.sessions.create_session(&session).await?;

        tracing::info!(
            user_id = %session.user_id,
            session_id = %session.session_id,
            expires_at = %session.expires_at,
            "Session created"
        );

        Ok(session)
    }

    /// Resolve a bearer token to its live session.
    ///
    /// Expired sessions are removed on sight. With sliding refresh enabled the
    /// session's expiry moves forward on every successful call.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidToken`] for tokens that are not session ids
    /// - [`AuthError::SessionNotFound`] for unknown or logged-out sessions
    /// - [`AuthError::SessionExpired`] once the TTL has elapsed
    /// - [`AuthError::StoreError`] if the session store fails
    pub async fn authorize(&self, token: &str) -> Result<Session> {
        let session_id = SessionId::parse(token)?;
        let mut session = self.sessions.get_session(session_id).await?;

        let now = self.clock.now();
        if session.is_expired_at(now) {
            tracing::debug!(session_id = %session_id, "Session expired");
            self.sessions.delete_session(session_id).await?;
            return Err(AuthError::SessionExpired);
        }

        if self.config.sliding_refresh {
            session.last_active = now;
            session.expires_at = self.config.expiry_from(now);
            self.sessions.update_session(&session).await?;
        }

        Ok(session)
    }

    /// Close the session behind `token`.
    ///
    /// Idempotent: logging out an unknown or already closed session succeeds.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidToken`] for tokens that are not session ids
    /// - [`AuthError::StoreError`] if the session store fails
    pub async fn logout(&self, token: &str) -> Result<()> {
        let session_id = SessionId::parse(token)?;
        self.sessions.delete_session(session_id).await?;

        tracing::info!(session_id = %session_id, "Session closed");
        Ok(())
    }

    /// Drop every session that has expired by the gate's clock.
    ///
    /// Sessions whose token is never presented again are only reclaimed here.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreError`] if the session store fails.
    pub async fn evict_expired_sessions(&self) -> Result<usize> {
        let evicted = self.sessions.evict_expired(self.clock.now()).await?;
        if evicted > 0 {
            tracing::debug!(evicted, "Expired sessions evicted");
        }
        Ok(evicted)
    }
}
