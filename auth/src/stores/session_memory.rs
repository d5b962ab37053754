//! In-memory session store.

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{Session, SessionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory session store.
///
/// Expired sessions stay in the map until [`SessionStore::evict_expired`]
/// removes them or their token is presented again.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored sessions.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self
            .sessions
            .lock()
            .map_err(|_| AuthError::StoreError("Mutex lock failed".to_string()))?
            .len())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| AuthError::StoreError("Mutex lock failed".to_string()))?;

        if sessions.contains_key(&session.session_id) {
            return Err(AuthError::StoreError("Session ID already exists".to_string()));
        }

        sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn get_session(&self, session_id: SessionId) -> Result<Session> {
        self.sessions
            .lock()
            .map_err(|_| AuthError::StoreError("Mutex lock failed".to_string()))?
            .get(&session_id)
            .cloned()
            .ok_or(AuthError::SessionNotFound)
    }

    async fn update_session(&self, session: &Session) -> Result<()> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| AuthError::StoreError("Mutex lock failed".to_string()))?;

        match sessions.get_mut(&session.session_id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(AuthError::SessionNotFound),
        }
    }

    async fn delete_session(&self, session_id: SessionId) -> Result<()> {
        self.sessions
            .lock()
            .map_err(|_| AuthError::StoreError("Mutex lock failed".to_string()))?
            .remove(&session_id);
        Ok(())
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| AuthError::StoreError("Mutex lock failed".to_string()))?;

        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok(before - sessions.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use data_citation_core::UserId;

    fn session() -> Session {
        session_expiring_in(Duration::hours(1))
    }

    fn session_expiring_in(ttl: Duration) -> Session {
        let now = Utc::now();
        Session {
            session_id: SessionId::new(),
            user_id: UserId::new("alice"),
            created_at: now,
            last_active: now,
            expires_at: now + ttl,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemorySessionStore::new();
        let session = session();

        store.create_session(&session).await.unwrap();
        assert_eq!(store.get_session(session.session_id).await.unwrap(), session);
        assert_eq!(store.session_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = InMemorySessionStore::new();
        let session = session();

        store.create_session(&session).await.unwrap();
        assert!(store.create_session(&session).await.is_err());
    }

    #[tokio::test]
    async fn test_update_unknown_session() {
        let store = InMemorySessionStore::new();
        assert_eq!(
            store.update_session(&session()).await,
            Err(AuthError::SessionNotFound)
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemorySessionStore::new();
        let session = session();
        store.create_session(&session).await.unwrap();

        store.delete_session(session.session_id).await.unwrap();
        store.delete_session(session.session_id).await.unwrap();

        assert_eq!(
            store.get_session(session.session_id).await,
            Err(AuthError::SessionNotFound)
        );
    }

    #[tokio::test]
    async fn test_evict_expired_keeps_live_sessions() {
        let store = InMemorySessionStore::new();
        let live = session_expiring_in(Duration::hours(2));
        for _ in 0..3 {
            store
                .create_session(&session_expiring_in(Duration::minutes(10)))
                .await
                .unwrap();
        }
        store.create_session(&live).await.unwrap();

        let evicted = store
            .evict_expired(Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(evicted, 3);
        assert_eq!(store.session_count().unwrap(), 1);
        assert_eq!(store.get_session(live.session_id).await.unwrap(), live);
    }
}
