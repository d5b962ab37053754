//! Citation request lifecycle types.
//!
//! A [`CitationRequest`] starts `Pending` (or directly `Failed` for malformed
//! input) and is terminated exactly once. The transition rule lives here as a
//! pure function; stores only serialize access to it.

use crate::citation::CitationArtifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a citation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generate a new random `RequestId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the string form used in URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a UUID.
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(value).map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user id from a login name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the login name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of caller-facing failure reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// DOI failed structural validation.
    Malformed,
    /// DOI well-formed but unknown to the registry.
    NotFound,
    /// Registry stayed unavailable after the retry budget.
    Unavailable,
    /// Request exceeded its maximum lifetime while pending.
    Timeout,
}

impl FailureReason {
    /// Wire form (`malformed`, `not-found`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::NotFound => "not-found",
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse state label, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateKind {
    /// Resolution in progress.
    Pending,
    /// Terminal success.
    Succeeded,
    /// Terminal failure.
    Failed,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        })
    }
}

/// Lifecycle state of a request.
///
/// `Succeeded` and `Failed` are terminal. The result and the failure reason
/// live inside their variants, so exactly one of them exists once terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    /// Resolution in progress.
    Pending,
    /// Citation produced.
    Succeeded {
        /// The citation artifact.
        result: CitationArtifact,
    },
    /// Request failed.
    Failed {
        /// Why it failed.
        reason: FailureReason,
    },
}

impl RequestState {
    /// Returns `true` for `Succeeded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Coarse label.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Pending => StateKind::Pending,
            Self::Succeeded { .. } => StateKind::Succeeded,
            Self::Failed { .. } => StateKind::Failed,
        }
    }

    /// Failure reason, if failed.
    #[must_use]
    pub const fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Failed { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Citation artifact, if succeeded.
    #[must_use]
    pub const fn result(&self) -> Option<&CitationArtifact> {
        match self {
            Self::Succeeded { result } => Some(result),
            _ => None,
        }
    }
}

/// The outcome a pending request is terminated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOutcome {
    /// Resolution produced a citation.
    Succeeded(CitationArtifact),
    /// Resolution failed.
    Failed(FailureReason),
}

impl From<TerminalOutcome> for RequestState {
    fn from(outcome: TerminalOutcome) -> Self {
        match outcome {
            TerminalOutcome::Succeeded(result) => Self::Succeeded { result },
            TerminalOutcome::Failed(reason) => Self::Failed { reason },
        }
    }
}

/// Attempted to terminate a request that is already terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request {id} is already {state}")]
pub struct AlreadyTerminal {
    /// The request.
    pub id: RequestId,
    /// The state it is in.
    pub state: StateKind,
}

/// One submitted citation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRequest {
    /// Immutable identifier.
    pub id: RequestId,
    /// DOI exactly as submitted.
    pub doi: String,
    /// Current lifecycle state.
    #[serde(flatten)]
    pub state: RequestState,
    /// Identity of the creator; the only caller allowed to see the request.
    pub owner: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last state change.
    pub updated_at: DateTime<Utc>,
}

impl CitationRequest {
    /// A new pending request.
    #[must_use]
    pub fn pending(doi: impl Into<String>, owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: RequestId::new(),
            doi: doi.into(),
            state: RequestState::Pending,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// A request that failed before any resolution was attempted.
    #[must_use]
    pub fn rejected(
        doi: impl Into<String>,
        owner: UserId,
        reason: FailureReason,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            state: RequestState::Failed { reason },
            ..Self::pending(doi, owner, now)
        }
    }

    /// Whether `caller` owns this request.
    #[must_use]
    pub fn is_owned_by(&self, caller: &UserId) -> bool {
        &self.owner == caller
    }

    /// Apply the single allowed transition `Pending -> terminal`.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyTerminal`] and leaves the request untouched if it is
    /// not pending.
    pub fn terminate(
        &mut self,
        outcome: TerminalOutcome,
        now: DateTime<Utc>,
    ) -> Result<(), AlreadyTerminal> {
        if self.state.is_terminal() {
            return Err(AlreadyTerminal {
                id: self.id,
                state: self.state.kind(),
            });
        }

        self.state = outcome.into();
        self.updated_at = now;
        Ok(())
    }

    /// Client-facing poll view.
    #[must_use]
    pub fn poll_outcome(&self) -> PollOutcome {
        match &self.state {
            RequestState::Pending => PollOutcome::Pending,
            RequestState::Succeeded { result } => PollOutcome::Succeeded {
                result: result.clone(),
            },
            RequestState::Failed { reason } => PollOutcome::Failed { reason: *reason },
        }
    }
}

/// Simplified three-shape answer to a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollOutcome {
    /// Still resolving.
    Pending,
    /// Terminal success.
    Succeeded {
        /// The citation artifact.
        result: CitationArtifact,
    },
    /// Terminal failure.
    Failed {
        /// Why it failed.
        reason: FailureReason,
    },
}

impl PollOutcome {
    /// Returns `true` for `Succeeded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::citation::CitationMetadata;
    use crate::doi::Doi;
    use chrono::Duration;

    fn artifact() -> CitationArtifact {
        CitationArtifact::new(
            Doi::parse("10.11570/18.0001").unwrap(),
            CitationMetadata::default(),
        )
    }

    #[test]
    fn test_pending_terminates_once() {
        let now = Utc::now();
        let mut request = CitationRequest::pending("10.11570/18.0001", UserId::new("alice"), now);

        let later = now + Duration::seconds(3);
        request
            .terminate(TerminalOutcome::Succeeded(artifact()), later)
            .unwrap();
        assert_eq!(request.state.kind(), StateKind::Succeeded);
        assert_eq!(request.updated_at, later);

        let err = request
            .terminate(TerminalOutcome::Failed(FailureReason::Timeout), later + Duration::seconds(1))
            .unwrap_err();
        assert_eq!(err.state, StateKind::Succeeded);
        assert_eq!(request.updated_at, later);
        assert!(request.state.result().is_some());
    }

    #[test]
    fn test_rejected_is_already_terminal() {
        let mut request = CitationRequest::rejected(
            "99.9999",
            UserId::new("alice"),
            FailureReason::Malformed,
            Utc::now(),
        );

        assert_eq!(request.state.failure_reason(), Some(FailureReason::Malformed));
        assert!(request
            .terminate(TerminalOutcome::Succeeded(artifact()), Utc::now())
            .is_err());
    }

    #[test]
    fn test_poll_outcome_wire_format() {
        let json = serde_json::to_value(PollOutcome::Failed {
            reason: FailureReason::NotFound,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"state": "FAILED", "reason": "not-found"}));

        let json = serde_json::to_value(PollOutcome::Pending).unwrap();
        assert_eq!(json, serde_json::json!({"state": "PENDING"}));
    }

    #[test]
    fn test_request_serializes_flat_state() {
        let request = CitationRequest::rejected(
            "99.9999",
            UserId::new("alice"),
            FailureReason::Malformed,
            Utc::now(),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["state"], "FAILED");
        assert_eq!(json["reason"], "malformed");
        assert_eq!(json["owner"], "alice");
        assert_eq!(json["doi"], "99.9999");
    }
}
