//! Client-side polling and scenario fixtures.
//!
//! Waiting for a request to finish is an explicit loop with a deadline and
//! exponential backoff between polls, so a stuck request fails the test
//! instead of hanging it.

use data_citation_core::PollOutcome;
use data_citation_runtime::RetryPolicy;
use reqwest::Url;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Why [`poll_until_terminal`] gave up.
#[derive(Debug, Error)]
pub enum PollError<E> {
    /// Still PENDING when the deadline passed.
    #[error("request still pending after {polls} polls ({elapsed:?})")]
    TimedOut {
        /// Number of polls made.
        polls: usize,
        /// Time spent.
        elapsed: Duration,
    },

    /// The poll itself failed.
    #[error("poll failed: {0}")]
    Poll(E),
}

/// Poll until the outcome is terminal or `timeout` elapses.
///
/// The delay between polls follows `backoff.delay_for_attempt`, clipped to
/// the remaining time. `backoff.max_retries` is ignored; the deadline bounds
/// the loop.
///
/// # Errors
///
/// Returns [`PollError::Poll`] on the first failed poll and
/// [`PollError::TimedOut`] if the request is still pending at the deadline.
pub async fn poll_until_terminal<F, Fut, E>(
    backoff: &RetryPolicy,
    timeout: Duration,
    mut poll: F,
) -> Result<PollOutcome, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollOutcome, E>>,
{
    let start = Instant::now();
    let deadline = start + timeout;
    let mut polls = 0;

    loop {
        let outcome = poll().await.map_err(PollError::Poll)?;
        polls += 1;

        if outcome.is_terminal() {
            return Ok(outcome);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PollError::TimedOut {
                polls,
                elapsed: now - start,
            });
        }

        let delay = backoff.delay_for_attempt(polls - 1).min(deadline - now);
        tokio::time::sleep(delay).await;
    }
}

/// Backoff suited to polling an in-process processor.
#[must_use]
pub fn fast_polling() -> RetryPolicy {
    RetryPolicy::builder()
        .initial_delay(Duration::from_millis(2))
        .max_delay(Duration::from_millis(50))
        .multiplier(2.0)
        .build()
}

/// Endpoint and credentials for scenario tests.
///
/// Passed explicitly to each scenario instead of living in shared fixture
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    /// Submission endpoint, e.g. `http://localhost:8080/citation/request`.
    pub endpoint: String,
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Default submission endpoint for in-process scenarios.
pub const DEFAULT_ENDPOINT: &str = "http://localhost/citation/request";

impl TestContext {
    /// Create a context.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `CITATION_TEST_ENDPOINT`, `CITATION_TEST_USERNAME` and
    /// `CITATION_TEST_PASSWORD` through `lookup`, with in-process defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new(
            lookup("CITATION_TEST_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            lookup("CITATION_TEST_USERNAME").unwrap_or_else(|| "alice".to_string()),
            lookup("CITATION_TEST_PASSWORD").unwrap_or_else(|| "alice-password".to_string()),
        )
    }

    /// [`from_lookup`](Self::from_lookup) over the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Submission URL with `doi` as a properly encoded query parameter.
    ///
    /// Returns `None` if `endpoint` is not an absolute URL.
    #[must_use]
    pub fn submit_url(&self, doi: &str) -> Option<Url> {
        Url::parse_with_params(&self.endpoint, &[("doi", doi)]).ok()
    }
}
