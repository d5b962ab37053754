//! Error types for the request store and the processor.

use data_citation_auth::AuthError;
use data_citation_core::{AlreadyTerminal, RequestId};
use thiserror::Error;

/// Errors returned by a [`RequestStore`](crate::store::RequestStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No request with this id
    #[error("Request {0} not found")]
    NotFound(RequestId),

    /// Request exists but belongs to someone else
    #[error("Request {0} belongs to another user")]
    Forbidden(RequestId),

    /// Terminal transition attempted twice
    ///
    /// The first transition wins; the record is left unchanged.
    #[error(transparent)]
    AlreadyTerminal(#[from] AlreadyTerminal),

    /// Insert with an id that is already stored
    #[error("Request {0} already exists")]
    DuplicateId(RequestId),

    /// Backing storage failed (e.g. poisoned lock)
    #[error("Request store failure: {0}")]
    Internal(String),
}

/// Errors returned by the [`CitationProcessor`](crate::processor::CitationProcessor).
///
/// Resolution failures are never reported here; they are recorded on the
/// request and observed by polling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    /// Token missing, malformed, expired or unknown, or the session store failed
    #[error(transparent)]
    Authentication(#[from] AuthError),

    /// No request with this id
    #[error("Request {0} not found")]
    NotFound(RequestId),

    /// Caller does not own the request
    #[error("Request {0} belongs to another user")]
    Forbidden(RequestId),

    /// Processor is draining and accepts no new submissions
    #[error("Processor is shutting down")]
    ShuttingDown,

    /// Shutdown timed out waiting for resolutions to finish
    #[error("Shutdown timed out with {0} resolutions still running")]
    ShutdownTimeout(usize),

    /// Request store failed
    #[error("Request store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ProcessorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Forbidden(id) => Self::Forbidden(id),
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_caller_facing_variants() {
        let id = RequestId::new();

        assert_eq!(
            ProcessorError::from(StoreError::NotFound(id)),
            ProcessorError::NotFound(id)
        );
        assert_eq!(
            ProcessorError::from(StoreError::Forbidden(id)),
            ProcessorError::Forbidden(id)
        );
        assert!(matches!(
            ProcessorError::from(StoreError::Internal("poisoned".into())),
            ProcessorError::Store(_)
        ));
    }
}
