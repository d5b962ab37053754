//! Background sweep of stale and expired requests.
//!
//! Each pass fails requests that stayed PENDING longer than `max_lifetime`
//! with `timeout`, then evicts terminal requests whose last update is older
//! than `retention`. With a gate attached it also drops expired sessions.
//!
//! A lifetime or retention too large to subtract from the current time
//! disables that part of the pass.

use crate::error::StoreError;
use crate::metrics::SweepMetrics;
use crate::store::RequestStore;
use chrono::{DateTime, Duration, Utc};
use data_citation_auth::AccessGate;
use data_citation_core::{Clock, FailureReason, TerminalOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Sweep policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Longest a request may stay PENDING.
    ///
    /// Default: 5 minutes
    pub max_lifetime: Duration,

    /// How long terminal requests are kept.
    ///
    /// Default: 24 hours
    pub retention: Duration,

    /// Time between passes.
    ///
    /// Default: 30 seconds
    pub interval: std::time::Duration,
}

impl SweepConfig {
    /// Set the maximum PENDING lifetime.
    #[must_use]
    pub const fn with_max_lifetime(mut self, max_lifetime: Duration) -> Self {
        self.max_lifetime = max_lifetime;
        self
    }

    /// Set the terminal retention.
    #[must_use]
    pub const fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Set the pass interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: std::time::Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_lifetime: Duration::minutes(5),
            retention: Duration::hours(24),
            interval: std::time::Duration::from_secs(30),
        }
    }
}

/// What one pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// PENDING requests failed with `timeout`.
    pub timed_out: usize,
    /// Terminal requests removed.
    pub evicted: usize,
    /// Expired sessions removed.
    pub sessions_expired: usize,
}

/// Periodic timeout and retention sweeper.
pub struct Sweeper {
    store: Arc<dyn RequestStore>,
    clock: Arc<dyn Clock>,
    gate: Option<AccessGate>,
    config: SweepConfig,
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("config", &self.config)
            .field("sweeps_sessions", &self.gate.is_some())
            .finish_non_exhaustive()
    }
}

impl Sweeper {
    /// Create a sweeper over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RequestStore>, clock: Arc<dyn Clock>, config: SweepConfig) -> Self {
        Self {
            store,
            clock,
            gate: None,
            config,
        }
    }

    /// Also evict expired sessions from `gate` on every pass.
    #[must_use]
    pub fn with_gate(mut self, gate: AccessGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Run a single pass.
    ///
    /// A request that reaches a terminal state between the scan and its
    /// timeout transition keeps that state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if the request store or the session
    /// store fails.
    pub async fn sweep_once(&self) -> Result<SweepReport, StoreError> {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        if let Some(cutoff) = cutoff(now, self.config.max_lifetime) {
            report.timed_out = self.time_out_pending(cutoff, now)?;
        }

        if let Some(cutoff) = cutoff(now, self.config.retention) {
            report.evicted = self.store.evict_terminal_before(cutoff)?;
        }

        if let Some(gate) = &self.gate {
            report.sessions_expired = gate
                .evict_expired_sessions()
                .await
                .map_err(|e| StoreError::Internal(format!("session sweep failed: {e}")))?;
        }

        if report != SweepReport::default() {
            tracing::debug!(
                timed_out = report.timed_out,
                evicted = report.evicted,
                sessions_expired = report.sessions_expired,
                "Sweep pass finished"
            );
        }
        SweepMetrics::record_timed_out(report.timed_out);
        SweepMetrics::record_evicted(report.evicted);

        Ok(report)
    }

    fn time_out_pending(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut timed_out = 0;

        for id in self.store.pending_created_before(cutoff)? {
            match self.store.transition_to_terminal(
                id,
                TerminalOutcome::Failed(FailureReason::Timeout),
                now,
            ) {
                Ok(_) => {
                    tracing::info!(request_id = %id, "Citation request timed out");
                    timed_out += 1;
                }
                Err(StoreError::AlreadyTerminal(_) | StoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(timed_out)
    }

    /// Run passes every `interval` until `shutdown` flips to `true` or its
    /// sender is dropped.
    #[must_use]
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            tracing::info!(
                interval_ms = self.config.interval.as_millis(),
                "Request sweeper started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep_once().await {
                            tracing::error!(error = %e, "Sweep pass failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Request sweeper stopped");
        })
    }
}

/// `now - age`, or `None` when that falls off the calendar.
fn cutoff(now: DateTime<Utc>, age: Duration) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(age)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::store::InMemoryRequestStore;
    use chrono::TimeZone;
    use data_citation_auth::{
        Credentials, InMemorySessionStore, SessionConfig, StaticCredentialVerifier,
    };
    use data_citation_core::{RequestState, UserId};
    use std::sync::Mutex;

    struct TestClock(Mutex<DateTime<Utc>>);

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn setup() -> (Arc<InMemoryRequestStore>, Arc<TestClock>, Sweeper) {
        let store = Arc::new(InMemoryRequestStore::new());
        let clock = Arc::new(TestClock(Mutex::new(start())));
        let sweeper = Sweeper::new(
            store.clone(),
            clock.clone(),
            SweepConfig::default()
                .with_max_lifetime(Duration::minutes(5))
                .with_retention(Duration::minutes(30)),
        );
        (store, clock, sweeper)
    }

    #[tokio::test]
    async fn test_stale_pending_times_out() {
        let (store, clock, sweeper) = setup();
        let alice = UserId::new("alice");
        let id = store.create("10.1000/182", &alice, start()).unwrap();

        *clock.0.lock().unwrap() = start() + Duration::minutes(4);
        assert_eq!(sweeper.sweep_once().await.unwrap(), SweepReport::default());

        *clock.0.lock().unwrap() = start() + Duration::minutes(6);
        assert_eq!(sweeper.sweep_once().await.unwrap().timed_out, 1);
        assert_eq!(
            store.get(id, &alice).unwrap().state,
            RequestState::Failed {
                reason: FailureReason::Timeout
            }
        );
    }

    #[tokio::test]
    async fn test_old_terminal_requests_are_evicted() {
        let (store, clock, sweeper) = setup();
        let alice = UserId::new("alice");
        let id = store.create("10.1000/182", &alice, start()).unwrap();
        store
            .transition_to_terminal(id, TerminalOutcome::Failed(FailureReason::NotFound), start())
            .unwrap();

        *clock.0.lock().unwrap() = start() + Duration::minutes(31);
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report.evicted, 1);
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_unrepresentable_cutoffs_disable_that_sweep() {
        let (store, clock, _) = setup();
        let huge = Duration::seconds(10_000_000_000_000);
        let sweeper = Sweeper::new(
            store.clone(),
            clock.clone(),
            SweepConfig::default()
                .with_max_lifetime(huge)
                .with_retention(huge),
        );
        let alice = UserId::new("alice");
        let pending = store.create("10.1000/182", &alice, start()).unwrap();
        let done = store.create("10.1000/183", &alice, start()).unwrap();
        store
            .transition_to_terminal(done, TerminalOutcome::Failed(FailureReason::NotFound), start())
            .unwrap();

        *clock.0.lock().unwrap() = start() + Duration::days(365);
        assert_eq!(sweeper.sweep_once().await.unwrap(), SweepReport::default());

        assert!(store.is_pending(pending).unwrap());
        assert_eq!(store.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_swept() {
        let (store, clock, _) = setup();
        let sessions = Arc::new(InMemorySessionStore::new());
        let gate = AccessGate::new(
            sessions.clone(),
            Arc::new(StaticCredentialVerifier::from_pairs([("alice", "secret")])),
            clock.clone(),
            SessionConfig::new(Duration::minutes(10)),
        );
        let sweeper =
            Sweeper::new(store, clock.clone(), SweepConfig::default()).with_gate(gate.clone());

        for _ in 0..50 {
            gate.login(&Credentials::new("alice", "secret")).await.unwrap();
        }
        assert_eq!(sweeper.sweep_once().await.unwrap().sessions_expired, 0);

        *clock.0.lock().unwrap() = start() + Duration::days(30);
        assert_eq!(sweeper.sweep_once().await.unwrap().sessions_expired, 50);
        assert_eq!(sessions.session_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spawned_sweeper_stops_on_shutdown() {
        let (_, _, sweeper) = setup();
        let sweeper = Sweeper {
            config: sweeper.config.clone().with_interval(std::time::Duration::from_millis(5)),
            ..sweeper
        };
        let (tx, rx) = watch::channel(false);

        let handle = sweeper.spawn(rx);
        tx.send(true).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
