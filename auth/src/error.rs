//! Error types for authentication and authorization operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the access gate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// Invalid credentials provided.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Session token is not a well-formed session id.
    #[error("Invalid session token")]
    InvalidToken,

    // ═══════════════════════════════════════════════════════════
    // Session Errors
    // ═══════════════════════════════════════════════════════════

    /// Session has expired.
    #[error("Session has expired")]
    SessionExpired,

    /// Session not found.
    #[error("Session not found")]
    SessionNotFound,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Session storage failed.
    #[error("Session store error: {0}")]
    StoreError(String),

    /// Invalid authentication configuration.
    #[error("Invalid auth configuration: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Returns `true` if this error means the caller is not authenticated.
    ///
    /// # Examples
    ///
    /// ```
    /// # use data_citation_auth::AuthError;
    /// assert!(AuthError::SessionExpired.is_unauthenticated());
    /// assert!(!AuthError::StoreError("down".into()).is_unauthenticated());
    /// ```
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::InvalidToken
                | Self::SessionExpired
                | Self::SessionNotFound
        )
    }
}
