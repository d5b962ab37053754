//! Session store trait.

use crate::error::Result;
use crate::state::{Session, SessionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Session store.
///
/// This trait abstracts over session storage.
///
/// # Implementation Notes
///
/// - Expiry is decided by the gate against its injected clock, so stores
///   return expired sessions as-is until [`evict_expired`](Self::evict_expired)
///   runs
/// - Fast lookups: every authorized call reads the store once
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create session.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Session ID already exists
    async fn create_session(&self, session: &Session) -> Result<()>;

    /// Get session.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Session not found → `AuthError::SessionNotFound`
    async fn get_session(&self, session_id: SessionId) -> Result<Session>;

    /// Update session (`last_active`, `expires_at`).
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Storage fails
    /// - Session not found
    async fn update_session(&self, session: &Session) -> Result<()>;

    /// Delete session. Deleting an unknown session is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    async fn delete_session(&self, session_id: SessionId) -> Result<()>;

    /// Remove every session whose expiry is at or before `now`.
    ///
    /// Returns the number of sessions removed.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}
