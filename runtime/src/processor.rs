//! The citation request processor.
//!
//! Accepts submissions, persists them, and drives each valid DOI through the
//! resolver on a background task:
//!
//! ```text
//! submit ──▶ validate ──invalid──▶ FAILED(malformed)          (no task spawned)
//!               │
//!             valid ──▶ PENDING ──spawn──▶ resolve (+ retries)
//!                                            ├─ Found ──────▶ SUCCEEDED(result)
//!                                            ├─ NotFound ───▶ FAILED(not-found)
//!                                            └─ exhausted ──▶ FAILED(unavailable)
//! ```
//!
//! Every public operation authorizes its bearer token through the
//! [`AccessGate`] first; request records are only ever handed to their owner.

use crate::error::{ProcessorError, StoreError};
use crate::health::HealthCheck;
use crate::metrics::RequestMetrics;
use crate::retry::{RetryPolicy, retry_with_predicate};
use crate::store::RequestStore;
use data_citation_auth::AccessGate;
use data_citation_core::{
    CitationRequest, Clock, Doi, FailureReason, PollOutcome, RequestId, ResolveOutcome, Resolver,
    StateKind, TerminalOutcome, UserId, ValidationResult, validate,
};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Processor tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    /// Backoff and retry budget for `Unavailable` resolver answers.
    pub retry: RetryPolicy,

    /// Upper bound on resolutions running at once.
    ///
    /// Default: 16
    pub max_concurrent_resolutions: usize,
}

impl ProcessorConfig {
    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the concurrency bound, clamped to `1..=Semaphore::MAX_PERMITS`.
    #[must_use]
    pub fn with_max_concurrent_resolutions(mut self, max: usize) -> Self {
        self.max_concurrent_resolutions = max.clamp(1, Semaphore::MAX_PERMITS);
        self
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_concurrent_resolutions: 16,
        }
    }
}

/// Answer to a submission: the new id and the state it was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submission {
    /// Id to poll.
    pub request_id: RequestId,
    /// `PENDING` for valid DOIs, `FAILED` for malformed ones.
    pub state: StateKind,
}

/// Authenticated, asynchronous citation request processor.
///
/// Cheap to clone; clones share the same store, gate and worker budget.
#[derive(Clone)]
pub struct CitationProcessor {
    inner: Arc<Inner>,
}

struct Inner {
    gate: AccessGate,
    store: Arc<dyn RequestStore>,
    resolver: Arc<dyn Resolver>,
    clock: Arc<dyn Clock>,
    config: ProcessorConfig,
    permits: Arc<Semaphore>,
    in_flight: AtomicUsize,
    shutting_down: AtomicBool,
}

impl std::fmt::Debug for CitationProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CitationProcessor")
            .field("config", &self.inner.config)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

/// Why a resolution loop stopped retrying without a registry answer.
#[derive(Debug)]
enum AttemptError {
    Unavailable(String),
    Abandoned,
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(detail) => write!(f, "registry unavailable: {detail}"),
            Self::Abandoned => f.write_str("request no longer pending"),
        }
    }
}

/// Decrements the in-flight count when a resolution task ends, however it ends.
struct InFlightGuard(Arc<Inner>);

impl InFlightGuard {
    fn enter(inner: Arc<Inner>) -> Self {
        let now = inner.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        RequestMetrics::record_in_flight(now);
        Self(inner)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.0.in_flight.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        RequestMetrics::record_in_flight(now);
    }
}

impl CitationProcessor {
    /// Wire a processor from its collaborators.
    #[must_use]
    pub fn new(
        gate: AccessGate,
        store: Arc<dyn RequestStore>,
        resolver: Arc<dyn Resolver>,
        clock: Arc<dyn Clock>,
        config: ProcessorConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(
            config.max_concurrent_resolutions.clamp(1, Semaphore::MAX_PERMITS),
        ));
        Self {
            inner: Arc::new(Inner {
                gate,
                store,
                resolver,
                clock,
                config,
                permits,
                in_flight: AtomicUsize::new(0),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// The access gate in front of this processor.
    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.inner.gate
    }

    /// The backing request store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RequestStore> {
        &self.inner.store
    }

    /// Resolutions scheduled or running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    async fn authorize(&self, token: &str) -> Result<UserId, ProcessorError> {
        Ok(self.inner.gate.authorize(token).await?.user_id)
    }

    /// Submit a DOI for resolution.
    ///
    /// Malformed DOIs are recorded as `FAILED(malformed)` immediately and no
    /// resolution is scheduled. Valid DOIs are recorded as `PENDING` and
    /// resolved on a background task; this call never waits on the resolver.
    ///
    /// # Errors
    ///
    /// - [`ProcessorError::Authentication`] if the token is not accepted
    /// - [`ProcessorError::ShuttingDown`] while draining
    /// - [`ProcessorError::Store`] if the record cannot be stored
    pub async fn submit(&self, doi: &str, token: &str) -> Result<Submission, ProcessorError> {
        let owner = self.authorize(token).await?;

        if self.inner.shutting_down.load(Ordering::Acquire) {
            return Err(ProcessorError::ShuttingDown);
        }

        let now = self.inner.clock.now();

        let valid = match validate(doi) {
            ValidationResult::Valid(valid) => valid,
            ValidationResult::Invalid(reason) => {
                let request =
                    CitationRequest::rejected(doi, owner.clone(), FailureReason::Malformed, now);
                let request_id = self.inner.store.insert(request)?;

                tracing::info!(
                    request_id = %request_id,
                    owner = %owner,
                    doi,
                    reason = %reason,
                    "Citation request rejected: malformed DOI"
                );
                RequestMetrics::record_submitted("malformed");

                return Ok(Submission {
                    request_id,
                    state: StateKind::Failed,
                });
            }
        };

        let request_id = self.inner.store.create(doi, &owner, now)?;
        tracing::info!(
            request_id = %request_id,
            owner = %owner,
            doi = %valid,
            "Citation request accepted"
        );
        RequestMetrics::record_submitted("pending");

        let guard = InFlightGuard::enter(Arc::clone(&self.inner));
        tokio::spawn(resolve_request(guard, request_id, valid));

        Ok(Submission {
            request_id,
            state: StateKind::Pending,
        })
    }

    /// Current state of a request in the three-shape poll form.
    ///
    /// # Errors
    ///
    /// - [`ProcessorError::Authentication`] if the token is not accepted
    /// - [`ProcessorError::NotFound`] / [`ProcessorError::Forbidden`]
    pub async fn poll(&self, id: RequestId, token: &str) -> Result<PollOutcome, ProcessorError> {
        let caller = self.authorize(token).await?;
        Ok(self.inner.store.get(id, &caller)?.poll_outcome())
    }

    /// Full request record.
    ///
    /// # Errors
    ///
    /// Same as [`poll`](Self::poll).
    pub async fn request(
        &self,
        id: RequestId,
        token: &str,
    ) -> Result<CitationRequest, ProcessorError> {
        let caller = self.authorize(token).await?;
        Ok(self.inner.store.get(id, &caller)?)
    }

    /// The caller's requests, oldest first.
    ///
    /// # Errors
    ///
    /// - [`ProcessorError::Authentication`] if the token is not accepted
    /// - [`ProcessorError::Store`] if the store fails
    pub async fn list(&self, token: &str) -> Result<Vec<CitationRequest>, ProcessorError> {
        let caller = self.authorize(token).await?;
        Ok(self.inner.store.list_for_owner(&caller)?)
    }

    /// Delete one of the caller's requests.
    ///
    /// Deleting a PENDING request abandons its resolution; the late result is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Same as [`poll`](Self::poll).
    pub async fn delete(&self, id: RequestId, token: &str) -> Result<(), ProcessorError> {
        let caller = self.authorize(token).await?;
        let removed = self.inner.store.remove(id, &caller)?;

        tracing::info!(
            request_id = %id,
            owner = %caller,
            state = %removed.state.kind(),
            "Citation request deleted"
        );
        Ok(())
    }

    /// Processor health for readiness checks.
    #[must_use]
    pub fn health(&self) -> HealthCheck {
        let in_flight = self.in_flight();
        let capacity = self.inner.config.max_concurrent_resolutions;
        let available = self.inner.permits.available_permits();

        let check = if self.inner.shutting_down.load(Ordering::Acquire) {
            HealthCheck::unhealthy("processor", "Processor is shutting down")
        } else if available == 0 && in_flight > capacity {
            HealthCheck::degraded(
                "processor",
                format!("{} resolutions waiting for a worker", in_flight - capacity),
            )
        } else {
            HealthCheck::healthy("processor")
        };

        let check = check
            .with_metadata("in_flight", in_flight.to_string())
            .with_metadata("max_concurrent_resolutions", capacity.to_string());

        match self.inner.store.len() {
            Ok(tracked) => check.with_metadata("tracked_requests", tracked.to_string()),
            Err(e) => HealthCheck::unhealthy("processor", e.to_string()),
        }
    }

    /// Stop accepting submissions and wait for running resolutions.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::ShutdownTimeout`] if resolutions are still
    /// running when `timeout` elapses.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ProcessorError> {
        tracing::info!("Initiating graceful shutdown");
        self.inner.shutting_down.store(true, Ordering::Release);

        let start = Instant::now();
        let poll_interval = Duration::from_millis(50);

        loop {
            let pending = self.in_flight();

            if pending == 0 {
                tracing::info!("All resolutions completed, shutdown successful");
                return Ok(());
            }

            if start.elapsed() >= timeout {
                tracing::error!(
                    pending_resolutions = pending,
                    "Shutdown timeout: {} resolutions still running",
                    pending
                );
                return Err(ProcessorError::ShutdownTimeout(pending));
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// Background task: resolve one DOI and record the terminal outcome.
async fn resolve_request(guard: InFlightGuard, id: RequestId, doi: Doi) {
    let inner = &guard.0;

    let Ok(_permit) = Arc::clone(&inner.permits).acquire_owned().await else {
        tracing::error!(request_id = %id, "Worker pool closed, resolution not started");
        return;
    };

    let started = Instant::now();
    let counter = AtomicUsize::new(0);
    let attempts = &counter;
    let target = &doi;

    let answer = retry_with_predicate(
        &inner.config.retry,
        move || async move {
            // Deleted or timed out while queued for a permit or backing off
            if !inner.store.is_pending(id).unwrap_or(false) {
                return Err(AttemptError::Abandoned);
            }
            if attempts.fetch_add(1, Ordering::Relaxed) > 0 {
                RequestMetrics::record_retry();
            }

            match inner.resolver.resolve(target).await {
                ResolveOutcome::Found(artifact) => Ok(TerminalOutcome::Succeeded(artifact)),
                ResolveOutcome::NotFound => Ok(TerminalOutcome::Failed(FailureReason::NotFound)),
                ResolveOutcome::Unavailable(detail) => Err(AttemptError::Unavailable(detail)),
            }
        },
        |err| matches!(err, AttemptError::Unavailable(_)),
    )
    .await;

    let outcome = match answer {
        Ok(outcome) => outcome,
        Err(AttemptError::Unavailable(_)) => TerminalOutcome::Failed(FailureReason::Unavailable),
        Err(AttemptError::Abandoned) => {
            tracing::debug!(request_id = %id, "Request left PENDING before resolution, abandoned");
            return;
        }
    };

    match inner
        .store
        .transition_to_terminal(id, outcome, inner.clock.now())
    {
        Ok(request) => {
            let reason = request.state.failure_reason();
            tracing::info!(
                request_id = %id,
                doi = %doi,
                state = %request.state.kind(),
                reason = reason.map(FailureReason::as_str),
                attempts = counter.load(Ordering::Relaxed),
                "Citation request completed"
            );
            RequestMetrics::record_completed(reason, started.elapsed());
        }
        Err(StoreError::AlreadyTerminal(already)) => {
            tracing::info!(
                request_id = %id,
                state = %already.state,
                "Dropping late resolution result"
            );
        }
        Err(StoreError::NotFound(_)) => {
            tracing::info!(request_id = %id, "Request deleted before resolution completed");
        }
        Err(e) => {
            tracing::error!(request_id = %id, error = %e, "Failed to record resolution outcome");
        }
    }
}
