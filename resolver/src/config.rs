//! Resolver configuration.

use std::time::Duration;

/// Default registry endpoint.
pub const DEFAULT_BASE_URL: &str = "https://doi.org";

/// Media type requested from the registry.
pub const CSL_JSON: &str = "application/vnd.citationstyles.csl+json";

/// Configuration for [`DoiOrgResolver`](crate::DoiOrgResolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Registry base URL.
    ///
    /// Default: `https://doi.org`
    pub base_url: String,

    /// Per-request timeout (connect + body).
    ///
    /// Default: 10 seconds
    pub timeout: Duration,

    /// `User-Agent` sent with every lookup.
    pub user_agent: String,
}

impl ResolverConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("data-citation/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
