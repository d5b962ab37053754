//! Configuration management for the citation server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Parsing goes through a key lookup so tests never touch the process
//! environment.

use chrono::Duration as ChronoDuration;
use data_citation_auth::SessionConfig;
use data_citation_resolver::{DEFAULT_BASE_URL, ResolverConfig};
use data_citation_runtime::{ProcessorConfig, RetryPolicy, SweepConfig};
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;

/// Ceiling for every duration setting: one hundred years.
///
/// Larger values read as "never" and are clamped with a warning.
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Listener configuration
    pub server: ServerConfig,
    /// Registry client and retry budget
    pub resolver: ResolverSettings,
    /// Request lifetime and sweeping
    pub requests: RequestSettings,
    /// Session and user table
    pub auth: AuthSettings,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// HTTP API port
    pub port: u16,
    /// Prometheus scrape port
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolverSettings {
    /// DOI registry base URL
    pub base_url: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first `Unavailable` answer
    pub max_retries: usize,
    /// First backoff delay in milliseconds
    pub initial_backoff_ms: u64,
    /// Backoff cap in milliseconds
    pub max_backoff_ms: u64,
    /// Resolutions allowed to run at once
    pub max_concurrent_resolutions: usize,
}

/// Request lifecycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSettings {
    /// PENDING requests older than this are failed with `timeout`
    pub max_lifetime_secs: u64,
    /// Terminal requests untouched for this long are evicted
    pub retention_secs: u64,
    /// Sweep period
    pub sweep_interval_secs: u64,
}

/// Authentication configuration
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AuthSettings {
    /// Session TTL in seconds (default: 8 hours)
    pub session_ttl_secs: u64,
    /// `user:password,user2:password2`
    #[serde(skip_serializing)]
    pub users: String,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("users", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// Unset keys take their default. Unparsable values are logged and also
    /// fall back to the default. Durations are capped at
    /// [`MAX_DURATION_SECS`].
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed(&get, "PORT", 8080),
                metrics_port: parsed(&get, "METRICS_PORT", 9090),
                shutdown_timeout_secs: parsed_secs(&get, "SHUTDOWN_TIMEOUT_SECS", 30),
            },
            resolver: ResolverSettings {
                base_url: get("RESOLVER_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout_secs: parsed_secs(&get, "RESOLVER_TIMEOUT_SECS", 10),
                max_retries: parsed(&get, "RESOLVER_MAX_RETRIES", 3),
                initial_backoff_ms: parsed_millis(&get, "RESOLVER_INITIAL_BACKOFF_MS", 200),
                max_backoff_ms: parsed_millis(&get, "RESOLVER_MAX_BACKOFF_MS", 5_000),
                max_concurrent_resolutions: parsed(&get, "MAX_CONCURRENT_RESOLUTIONS", 16),
            },
            requests: RequestSettings {
                max_lifetime_secs: parsed_secs(&get, "REQUEST_MAX_LIFETIME_SECS", 300),
                retention_secs: parsed_secs(&get, "REQUEST_RETENTION_SECS", 86_400),
                sweep_interval_secs: parsed_secs(&get, "SWEEP_INTERVAL_SECS", 30),
            },
            auth: AuthSettings {
                session_ttl_secs: parsed_secs(&get, "SESSION_TTL_SECS", 28_800),
                users: get("CITATION_USERS").unwrap_or_default(),
            },
        }
    }

    /// Registry client configuration.
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::new(self.resolver.base_url.clone())
            .with_timeout(Duration::from_secs(self.resolver.timeout_secs))
    }

    /// Retry budget for `Unavailable` answers.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.resolver.max_retries)
            .initial_delay(Duration::from_millis(self.resolver.initial_backoff_ms))
            .max_delay(Duration::from_millis(self.resolver.max_backoff_ms))
            .build()
    }

    /// Processor configuration.
    #[must_use]
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig::default()
            .with_retry(self.retry_policy())
            .with_max_concurrent_resolutions(self.resolver.max_concurrent_resolutions)
    }

    /// Sweeper configuration.
    #[must_use]
    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig::default()
            .with_max_lifetime(seconds(self.requests.max_lifetime_secs))
            .with_retention(seconds(self.requests.retention_secs))
            .with_interval(Duration::from_secs(self.requests.sweep_interval_secs.max(1)))
    }

    /// Session configuration.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(seconds(self.auth.session_ttl_secs))
    }

    /// Graceful shutdown budget.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

fn parsed<T: FromStr + Copy>(get: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match get(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable configuration value");
            default
        }),
    }
}

fn parsed_secs(get: impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    capped(key, parsed(get, key, default), MAX_DURATION_SECS)
}

fn parsed_millis(get: impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    capped(key, parsed(get, key, default), MAX_DURATION_SECS * 1_000)
}

fn capped(key: &str, value: u64, max: u64) -> u64 {
    if value > max {
        tracing::warn!(key, value, max, "Clamping configuration value");
        return max;
    }
    value
}

fn seconds(secs: u64) -> ChronoDuration {
    ChronoDuration::seconds(i64::try_from(secs.min(MAX_DURATION_SECS)).unwrap_or_default())
}
