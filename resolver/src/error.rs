//! Error types for the registry client.

use thiserror::Error;

/// Errors that can occur while looking up a DOI.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Base URL cannot carry a DOI path
    #[error("Invalid resolver base URL: {0}")]
    InvalidBaseUrl(String),

    /// Registry does not know the identifier
    #[error("DOI not registered (status {status})")]
    NotRegistered {
        /// HTTP status code
        status: u16,
    },

    /// Registration agency cannot serve the requested metadata format
    #[error("Registry cannot serve CSL-JSON for this DOI")]
    UnsupportedFormat,

    /// Rate limited - too many requests
    #[error("Rate limited by registry")]
    RateLimited,

    /// Registry answered with a retryable status
    #[error("Registry error (status {status})")]
    Upstream {
        /// HTTP status code
        status: u16,
    },

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),
}

impl ResolverError {
    /// Whether the registry has positively answered "no such DOI".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotRegistered { .. })
    }
}
