//! Service wiring.

use crate::config::Config;
use anyhow::Context;
use axum::Router;
use data_citation_auth::{AccessGate, InMemorySessionStore, StaticCredentialVerifier};
use data_citation_core::{Clock, Resolver, SystemClock};
use data_citation_resolver::DoiOrgResolver;
use data_citation_runtime::{CitationProcessor, InMemoryRequestStore, RequestStore, Sweeper};
use data_citation_web::{AppState, build_router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// All long-lived components of a running server.
#[derive(Debug)]
pub struct CitationApp {
    /// The processor behind the HTTP API.
    pub processor: CitationProcessor,
    /// Timeout and retention sweeper, not yet started.
    pub sweeper: Sweeper,
}

impl CitationApp {
    /// Wire the service against the real DOI registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the user table or the resolver configuration is
    /// invalid.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let resolver = DoiOrgResolver::new(&config.resolver_config())
            .context("invalid resolver configuration")?;
        Self::with_resolver(config, Arc::new(resolver), Arc::new(SystemClock))
    }

    /// Wire the service with an explicit resolver and clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the user table is invalid.
    pub fn with_resolver(
        config: &Config,
        resolver: Arc<dyn Resolver>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let verifier = StaticCredentialVerifier::parse(&config.auth.users)
            .context("invalid CITATION_USERS")?;
        if verifier.is_empty() {
            tracing::warn!("CITATION_USERS is empty, no one will be able to log in");
        }

        let gate = AccessGate::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(verifier),
            Arc::clone(&clock),
            config.session_config(),
        );

        let store: Arc<dyn RequestStore> = Arc::new(InMemoryRequestStore::new());
        let processor = CitationProcessor::new(
            gate,
            Arc::clone(&store),
            resolver,
            Arc::clone(&clock),
            config.processor_config(),
        );
        let sweeper =
            Sweeper::new(store, clock, config.sweep_config()).with_gate(processor.gate().clone());

        Ok(Self { processor, sweeper })
    }

    /// The HTTP API with request tracing.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(AppState::new(self.processor.clone())).layer(TraceLayer::new_for_http())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    fn config(users: &str) -> Config {
        let users = users.to_string();
        Config::from_lookup(move |key| (key == "CITATION_USERS").then(|| users.clone()))
    }

    #[test]
    fn test_wiring_accepts_user_table() {
        let app = CitationApp::new(&config("alice:pw,bob:pw2")).unwrap();
        assert_eq!(app.processor.in_flight(), 0);
    }

    #[test]
    fn test_wiring_rejects_bad_user_table() {
        let err = CitationApp::new(&config("alice")).unwrap_err();
        assert!(err.to_string().contains("CITATION_USERS"));
    }
}
