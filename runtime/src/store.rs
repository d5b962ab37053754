//! Request state store.
//!
//! The store owns every [`CitationRequest`] and serializes the single
//! `Pending -> terminal` transition per id. All mutation happens under one
//! write lock and nothing is awaited while it is held, so concurrent
//! completions for the same id produce exactly one winner.

use crate::error::StoreError;
use data_citation_core::{
    CitationRequest, DateTime, RequestId, RequestState, TerminalOutcome, UserId, Utc,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage for citation requests.
///
/// # Implementation Notes
///
/// - Methods are synchronous: implementations must not block on I/O while
///   holding internal locks
/// - Ownership checks happen inside the store so callers cannot observe a
///   record they do not own
pub trait RequestStore: Send + Sync {
    /// Create a PENDING record and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if storage fails.
    fn create(&self, doi: &str, owner: &UserId, now: DateTime<Utc>)
    -> Result<RequestId, StoreError>;

    /// Store a fully built record (e.g. one that is already FAILED).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if the id is taken.
    fn insert(&self, request: CitationRequest) -> Result<RequestId, StoreError>;

    /// Read a record on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] or [`StoreError::Forbidden`].
    fn get(&self, id: RequestId, caller: &UserId) -> Result<CitationRequest, StoreError>;

    /// Whether `id` exists and is still PENDING.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if storage fails.
    fn is_pending(&self, id: RequestId) -> Result<bool, StoreError>;

    /// Apply the terminal transition and return the updated record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyTerminal`] (state unchanged) or
    /// [`StoreError::NotFound`].
    fn transition_to_terminal(
        &self,
        id: RequestId,
        outcome: TerminalOutcome,
        now: DateTime<Utc>,
    ) -> Result<CitationRequest, StoreError>;

    /// All records owned by `owner`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if storage fails.
    fn list_for_owner(&self, owner: &UserId) -> Result<Vec<CitationRequest>, StoreError>;

    /// Delete a record on behalf of `caller` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] or [`StoreError::Forbidden`].
    fn remove(&self, id: RequestId, caller: &UserId) -> Result<CitationRequest, StoreError>;

    /// Ids of PENDING records created strictly before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if storage fails.
    fn pending_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<RequestId>, StoreError>;

    /// Drop terminal records last updated strictly before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if storage fails.
    fn evict_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if storage fails.
    fn len(&self) -> Result<usize, StoreError>;

    /// Whether the store is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if storage fails.
    fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|len| len == 0)
    }
}

/// In-process [`RequestStore`].
#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<RequestId, CitationRequest>>,
}

impl InMemoryRequestStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<RequestId, CitationRequest>>, StoreError> {
        self.requests
            .read()
            .map_err(|_| StoreError::Internal("RwLock read failed".to_string()))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<RequestId, CitationRequest>>, StoreError> {
        self.requests
            .write()
            .map_err(|_| StoreError::Internal("RwLock write failed".to_string()))
    }
}

fn owned<'a>(
    request: Option<&'a CitationRequest>,
    id: RequestId,
    caller: &UserId,
) -> Result<&'a CitationRequest, StoreError> {
    match request {
        None => Err(StoreError::NotFound(id)),
        Some(request) if !request.is_owned_by(caller) => Err(StoreError::Forbidden(id)),
        Some(request) => Ok(request),
    }
}

impl RequestStore for InMemoryRequestStore {
    fn create(
        &self,
        doi: &str,
        owner: &UserId,
        now: DateTime<Utc>,
    ) -> Result<RequestId, StoreError> {
        self.insert(CitationRequest::pending(doi, owner.clone(), now))
    }

    fn insert(&self, request: CitationRequest) -> Result<RequestId, StoreError> {
        let mut requests = self.write()?;
        let id = request.id;

        if requests.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }

        requests.insert(id, request);
        Ok(id)
    }

    fn get(&self, id: RequestId, caller: &UserId) -> Result<CitationRequest, StoreError> {
        let requests = self.read()?;
        owned(requests.get(&id), id, caller).cloned()
    }

    fn is_pending(&self, id: RequestId) -> Result<bool, StoreError> {
        Ok(self
            .read()?
            .get(&id)
            .is_some_and(|request| !request.state.is_terminal()))
    }

    fn transition_to_terminal(
        &self,
        id: RequestId,
        outcome: TerminalOutcome,
        now: DateTime<Utc>,
    ) -> Result<CitationRequest, StoreError> {
        let mut requests = self.write()?;
        let request = requests.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        request.terminate(outcome, now)?;
        Ok(request.clone())
    }

    fn list_for_owner(&self, owner: &UserId) -> Result<Vec<CitationRequest>, StoreError> {
        let mut listed: Vec<CitationRequest> = self
            .read()?
            .values()
            .filter(|request| request.is_owned_by(owner))
            .cloned()
            .collect();

        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(listed)
    }

    fn remove(&self, id: RequestId, caller: &UserId) -> Result<CitationRequest, StoreError> {
        let mut requests = self.write()?;
        owned(requests.get(&id), id, caller)?;
        requests.remove(&id).ok_or(StoreError::NotFound(id))
    }

    fn pending_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<RequestId>, StoreError> {
        Ok(self
            .read()?
            .values()
            .filter(|request| request.state == RequestState::Pending && request.created_at < cutoff)
            .map(|request| request.id)
            .collect())
    }

    fn evict_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut requests = self.write()?;
        let before = requests.len();

        requests.retain(|_, request| !(request.state.is_terminal() && request.updated_at < cutoff));

        Ok(before - requests.len())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use data_citation_core::{FailureReason, StateKind};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn alice() -> UserId {
        UserId::new("alice")
    }

    fn failed(reason: FailureReason) -> TerminalOutcome {
        TerminalOutcome::Failed(reason)
    }

    #[test]
    fn test_create_and_get() {
        let store = InMemoryRequestStore::new();
        let id = store.create("10.1000/182", &alice(), now()).unwrap();

        let request = store.get(id, &alice()).unwrap();
        assert_eq!(request.doi, "10.1000/182");
        assert_eq!(request.state, RequestState::Pending);
        assert!(store.is_pending(id).unwrap());
    }

    #[test]
    fn test_unknown_and_foreign_ids() {
        let store = InMemoryRequestStore::new();
        let id = store.create("10.1000/182", &alice(), now()).unwrap();
        let stranger = RequestId::new();

        assert_eq!(store.get(stranger, &alice()), Err(StoreError::NotFound(stranger)));
        assert_eq!(
            store.get(id, &UserId::new("mallory")),
            Err(StoreError::Forbidden(id))
        );
        assert_eq!(
            store.remove(id, &UserId::new("mallory")),
            Err(StoreError::Forbidden(id))
        );
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = InMemoryRequestStore::new();
        let request = CitationRequest::pending("10.1000/182", alice(), now());
        let copy = request.clone();

        store.insert(request).unwrap();
        assert_eq!(store.insert(copy.clone()), Err(StoreError::DuplicateId(copy.id)));
    }

    #[test]
    fn test_second_transition_is_rejected() {
        let store = InMemoryRequestStore::new();
        let id = store.create("10.1000/182", &alice(), now()).unwrap();

        let done = store
            .transition_to_terminal(id, failed(FailureReason::NotFound), now())
            .unwrap();
        assert_eq!(done.state.failure_reason(), Some(FailureReason::NotFound));

        let err = store
            .transition_to_terminal(id, failed(FailureReason::Timeout), now())
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyTerminal(e) if e.state == StateKind::Failed));
        assert_eq!(
            store.get(id, &alice()).unwrap().state.failure_reason(),
            Some(FailureReason::NotFound)
        );
    }

    #[test]
    fn test_transition_of_missing_request() {
        let store = InMemoryRequestStore::new();
        let id = RequestId::new();
        assert_eq!(
            store.transition_to_terminal(id, failed(FailureReason::Timeout), now()),
            Err(StoreError::NotFound(id))
        );
    }

    #[test]
    fn test_list_for_owner_is_ordered_and_scoped() {
        let store = InMemoryRequestStore::new();
        let second = store
            .create("10.1000/2", &alice(), now() + Duration::seconds(1))
            .unwrap();
        let first = store.create("10.1000/1", &alice(), now()).unwrap();
        store.create("10.1000/3", &UserId::new("bob"), now()).unwrap();

        let ids: Vec<RequestId> = store
            .list_for_owner(&alice())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_sweep_queries() {
        let store = InMemoryRequestStore::new();
        let old_pending = store.create("10.1000/1", &alice(), now()).unwrap();
        let new_pending = store
            .create("10.1000/2", &alice(), now() + Duration::minutes(10))
            .unwrap();
        let old_terminal = store.create("10.1000/3", &alice(), now()).unwrap();
        store
            .transition_to_terminal(old_terminal, failed(FailureReason::NotFound), now())
            .unwrap();

        let cutoff = now() + Duration::minutes(5);
        assert_eq!(store.pending_created_before(cutoff).unwrap(), vec![old_pending]);

        assert_eq!(store.evict_terminal_before(cutoff).unwrap(), 1);
        assert_eq!(store.len().unwrap(), 2);
        assert!(store.is_pending(new_pending).unwrap());
        assert!(!store.is_pending(old_terminal).unwrap());
    }

    #[test]
    fn test_concurrent_transitions_have_one_winner() {
        let store = Arc::new(InMemoryRequestStore::new());
        let id = store.create("10.1000/182", &alice(), now()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let reason = if i % 2 == 0 {
                        FailureReason::NotFound
                    } else {
                        FailureReason::Timeout
                    };
                    store.transition_to_terminal(id, failed(reason), now()).is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    proptest! {
        #[test]
        fn prop_first_terminal_outcome_sticks(reasons in prop::collection::vec(0u8..3, 1..10)) {
            let store = InMemoryRequestStore::new();
            let id = store.create("10.1000/182", &alice(), now()).unwrap();
            let to_reason = |r: u8| match r {
                0 => FailureReason::NotFound,
                1 => FailureReason::Unavailable,
                _ => FailureReason::Timeout,
            };

            for r in &reasons {
                let _ = store.transition_to_terminal(id, failed(to_reason(*r)), now());
            }

            let state = store.get(id, &alice()).unwrap().state;
            prop_assert_eq!(state.failure_reason(), Some(to_reason(reasons[0])));
        }
    }
}
