//! Contract for the external DOI resolution service.
//!
//! Implementations perform the outbound lookup only. They never touch request
//! state; the processor interprets the [`ResolveOutcome`] and records it.

use crate::citation::CitationArtifact;
use crate::doi::Doi;
use async_trait::async_trait;

/// Result of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The registry knows the DOI.
    Found(CitationArtifact),
    /// The registry has no such identifier. Terminal.
    NotFound,
    /// Transient failure (network, timeout, throttling, 5xx). Retryable.
    Unavailable(String),
}

impl ResolveOutcome {
    /// Returns `true` if a retry could change the answer.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// External DOI resolver.
///
/// # Implementation Notes
///
/// - May suspend the caller for the duration of a network round trip
/// - Must classify failures: absent identifiers are `NotFound`, anything a
///   retry might fix is `Unavailable`
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Look up a validated DOI.
    async fn resolve(&self, doi: &Doi) -> ResolveOutcome;
}
