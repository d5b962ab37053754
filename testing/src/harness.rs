//! A fully wired processor over in-memory collaborators.

use crate::mocks::ManualClock;
use crate::polling::{PollError, fast_polling, poll_until_terminal};
use crate::resolver::ScriptedResolver;
use crate::test_epoch;
use chrono::Duration;
use data_citation_auth::{
    AccessGate, Credentials, InMemorySessionStore, SessionConfig, StaticCredentialVerifier,
};
use data_citation_core::{PollOutcome, RequestId};
use data_citation_runtime::{
    CitationProcessor, InMemoryRequestStore, ProcessorConfig, ProcessorError, RetryPolicy,
    SweepConfig, Sweeper,
};
use std::sync::Arc;

/// Users every harness knows, as `(username, password)`.
pub const DEFAULT_USERS: [(&str, &str); 2] = [("alice", "alice-password"), ("bob", "bob-password")];

/// Processor, store, resolver and clock wired for tests.
///
/// Time is a [`ManualClock`] starting at [`test_epoch`]; the resolver is a
/// [`ScriptedResolver`]; retries use millisecond backoff.
pub struct TestHarness {
    /// The processor under test.
    pub processor: CitationProcessor,
    /// The store behind it.
    pub store: Arc<InMemoryRequestStore>,
    /// The scripted resolver.
    pub resolver: Arc<ScriptedResolver>,
    /// Session store behind the gate.
    pub sessions: Arc<InMemorySessionStore>,
    /// The clock shared by gate, processor and sweeper.
    pub clock: Arc<ManualClock>,
    users: Vec<(String, String)>,
}

impl TestHarness {
    /// Start building a harness.
    #[must_use]
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// The gate in front of the processor.
    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        self.processor.gate()
    }

    /// Log in as a configured user and return the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if `username` is not configured or login fails.
    #[allow(clippy::panic)] // Test helper: a failed login is a broken test setup
    pub async fn login(&self, username: &str) -> String {
        let Some((_, password)) = self.users.iter().find(|(user, _)| user == username) else {
            panic!("unknown test user {username}");
        };

        match self.gate().login(&Credentials::new(username, password.clone())).await {
            Ok(session) => session.session_id.to_string(),
            Err(e) => panic!("login as {username} failed: {e}"),
        }
    }

    /// Poll a request until it is terminal (bounded by five seconds).
    ///
    /// # Errors
    ///
    /// Returns the first processor error or a timeout.
    pub async fn wait_for(
        &self,
        id: RequestId,
        token: &str,
    ) -> Result<PollOutcome, PollError<ProcessorError>> {
        let processor = &self.processor;
        poll_until_terminal(
            &fast_polling(),
            std::time::Duration::from_secs(5),
            move || async move { processor.poll(id, token).await },
        )
        .await
    }

    /// A sweeper over this harness's store, sessions and clock.
    #[must_use]
    pub fn sweeper(&self, config: SweepConfig) -> Sweeper {
        Sweeper::new(self.store.clone(), self.clock.clone(), config)
            .with_gate(self.gate().clone())
    }
}

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    resolver: ScriptedResolver,
    retry: RetryPolicy,
    max_concurrent_resolutions: usize,
    session_ttl: Duration,
    users: Vec<(String, String)>,
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self {
            resolver: ScriptedResolver::new(),
            retry: RetryPolicy::builder()
                .max_retries(3)
                .initial_delay(std::time::Duration::from_millis(1))
                .max_delay(std::time::Duration::from_millis(5))
                .build(),
            max_concurrent_resolutions: 4,
            session_ttl: Duration::hours(1),
            users: DEFAULT_USERS
                .iter()
                .map(|(user, password)| ((*user).to_string(), (*password).to_string()))
                .collect(),
        }
    }
}

impl TestHarnessBuilder {
    /// Use this resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: ScriptedResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Use this retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bound concurrent resolutions.
    #[must_use]
    pub const fn max_concurrent_resolutions(mut self, max: usize) -> Self {
        self.max_concurrent_resolutions = max;
        self
    }

    /// Session TTL.
    #[must_use]
    pub const fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Add a user.
    #[must_use]
    pub fn user(mut self, username: &str, password: &str) -> Self {
        self.users.push((username.to_string(), password.to_string()));
        self
    }

    /// Wire everything up.
    #[must_use]
    pub fn build(self) -> TestHarness {
        let clock = Arc::new(ManualClock::starting_at(test_epoch()));
        let sessions = Arc::new(InMemorySessionStore::new());
        let store = Arc::new(InMemoryRequestStore::new());
        let resolver = Arc::new(self.resolver);

        let gate = AccessGate::new(
            sessions.clone(),
            Arc::new(StaticCredentialVerifier::from_pairs(self.users.clone())),
            clock.clone(),
            SessionConfig::new(self.session_ttl),
        );

        let processor = CitationProcessor::new(
            gate,
            store.clone(),
            resolver.clone(),
            clock.clone(),
            ProcessorConfig::default()
                .with_retry(self.retry)
                .with_max_concurrent_resolutions(self.max_concurrent_resolutions),
        );

        TestHarness {
            processor,
            store,
            resolver,
            sessions,
            clock,
            users: self.users,
        }
    }
}
