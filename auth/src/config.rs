//! Session configuration.
//!
//! Configuration values should be provided by the application, not hardcoded.

use chrono::{DateTime, Duration, Utc};

/// Session lifetime configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session time-to-live after login (and after each refresh).
    ///
    /// Default: 8 hours
    pub ttl: Duration,

    /// Extend the expiry on every authorized call.
    ///
    /// Default: `true`
    pub sliding_refresh: bool,
}

impl SessionConfig {
    /// Create a configuration with the given TTL.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sliding_refresh: true,
        }
    }

    /// Set session time-to-live.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Expiry of a session opened or refreshed at `now`.
    ///
    /// A TTL that overflows the calendar means the session never expires.
    #[must_use]
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Enable or disable sliding refresh.
    #[must_use]
    pub const fn with_sliding_refresh(mut self, enabled: bool) -> Self {
        self.sliding_refresh = enabled;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Duration::hours(8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfig::default()
            .with_ttl(Duration::minutes(30))
            .with_sliding_refresh(false);

        assert_eq!(config.ttl, Duration::minutes(30));
        assert!(!config.sliding_refresh);
    }

    #[test]
    fn test_expiry_saturates_on_huge_ttl() {
        let now = Utc::now();
        assert_eq!(
            SessionConfig::new(Duration::minutes(5)).expiry_from(now),
            now + Duration::minutes(5)
        );

        let forever = SessionConfig::new(Duration::seconds(10_000_000_000_000));
        assert_eq!(forever.expiry_from(now), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.ttl, Duration::hours(8));
        assert!(config.sliding_refresh);
    }
}
