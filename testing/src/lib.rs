//! # Data Citation Testing
//!
//! Testing utilities and helpers for the Data Citation service.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`ManualClock`])
//! - A scripted [`Resolver`](data_citation_core::Resolver) that never touches the network
//! - [`TestHarness`]: a fully wired processor with in-memory collaborators
//! - [`poll_until_terminal`]: bounded client-side polling with backoff
//! - [`TestContext`]: endpoint and credentials for scenario tests
//! - proptest strategies for DOIs
//!
//! ## Example
//!
//! ```ignore
//! use data_citation_testing::{TestHarness, poll_until_terminal};
//!
//! #[tokio::test]
//! async fn test_not_found() {
//!     let harness = TestHarness::builder().build();
//!     let token = harness.login("alice").await;
//!
//!     let submission = harness.processor.submit("10.1000/missing", &token).await?;
//!     let outcome = harness.wait_for(submission.request_id, &token).await?;
//!     assert!(outcome.is_terminal());
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use data_citation_core::environment::Clock;

pub mod harness;
pub mod polling;
pub mod resolver;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use data_citation_testing::mocks::FixedClock;
    /// use data_citation_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    ///
    /// Used to drive session expiry and request timeouts without sleeping.
    ///
    /// ```
    /// use data_citation_testing::mocks::ManualClock;
    /// use data_citation_core::environment::Clock;
    /// use chrono::Duration;
    ///
    /// let clock = ManualClock::starting_at(data_citation_testing::test_epoch());
    /// let before = clock.now();
    /// clock.advance(Duration::minutes(5));
    /// assert_eq!(clock.now() - before, Duration::minutes(5));
    /// ```
    #[derive(Debug)]
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock showing `time`.
        #[must_use]
        pub const fn starting_at(time: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(time),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
            *now += by;
        }

        /// Jump to an absolute time.
        pub fn set(&self, time: DateTime<Utc>) {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner) = time;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(super::test_epoch())
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Route `tracing` output through the test harness's captured stdout.
    ///
    /// Honors `RUST_LOG`; safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Structurally valid DOIs (`10.<4-7 digits>/<suffix>`).
    pub fn valid_doi() -> impl Strategy<Value = String> {
        (1000u32..9_999_999, "[A-Za-z0-9._;()-]{1,24}")
            .prop_map(|(registrant, suffix)| format!("10.{registrant}/{suffix}"))
    }

    /// Candidates that always fail validation.
    pub fn malformed_doi() -> impl Strategy<Value = String> {
        prop_oneof![
            // no separator
            "[0-9.]{0,12}",
            // foreign directory
            (11u32..100, 1000u32..99_999).prop_map(|(dir, reg)| format!("{dir}.{reg}/x")),
            // short registrant
            (0u32..1000).prop_map(|reg| format!("10.{reg}/x")),
            // empty suffix
            (1000u32..99_999).prop_map(|reg| format!("10.{reg}/")),
        ]
    }
}

/// 2025-01-01 00:00:00 UTC, the fixed start time used across tests.
#[must_use]
pub fn test_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
}

// Re-export commonly used items
pub use harness::{TestHarness, TestHarnessBuilder};
pub use helpers::init_test_tracing;
pub use mocks::{FixedClock, ManualClock, test_clock};
pub use polling::{PollError, TestContext, poll_until_terminal};
pub use resolver::ScriptedResolver;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::starting_at(test_epoch());
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now() - test_epoch(), Duration::seconds(90));
    }
}
