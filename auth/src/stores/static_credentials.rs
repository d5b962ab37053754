//! Credential verifier backed by a fixed user table.
//!
//! Stand-in for the external login service: the table comes from
//! configuration (`user:password,user2:password2`).

use crate::error::{AuthError, Result};
use crate::providers::CredentialVerifier;
use crate::state::Credentials;
use async_trait::async_trait;
use constant_time_eq::constant_time_eq;
use data_citation_core::UserId;
use std::collections::HashMap;

/// Compared against when the username is unknown, so both paths do the same work.
const DUMMY_PASSWORD: &str = "\u{0}unknown-user\u{0}";

/// Verifies credentials against an in-memory user table.
#[derive(Clone, Default)]
pub struct StaticCredentialVerifier {
    users: HashMap<String, String>,
}

impl std::fmt::Debug for StaticCredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.users.keys().collect();
        names.sort();
        f.debug_struct("StaticCredentialVerifier")
            .field("users", &names)
            .finish()
    }
}

impl StaticCredentialVerifier {
    /// Create a verifier from `(username, password)` pairs.
    #[must_use]
    pub fn from_pairs<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            users: pairs
                .into_iter()
                .map(|(user, password)| (user.into(), password.into()))
                .collect(),
        }
    }

    /// Parse a `user:password,user2:password2` list.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] for entries without a `:` or with
    /// an empty username.
    pub fn parse(table: &str) -> Result<Self> {
        let mut users = HashMap::new();

        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (user, password) = entry.split_once(':').ok_or_else(|| {
                AuthError::Configuration("user entry without ':' separator".to_string())
            })?;

            if user.trim().is_empty() {
                return Err(AuthError::Configuration("empty username".to_string()));
            }

            users.insert(user.trim().to_string(), password.to_string());
        }

        Ok(Self { users })
    }

    /// Number of configured users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<UserId> {
        let (expected, known) = match self.users.get(&credentials.username) {
            Some(password) => (password.as_str(), true),
            None => (DUMMY_PASSWORD, false),
        };

        let matches = constant_time_eq(expected.as_bytes(), credentials.password.as_bytes());

        if known && matches {
            Ok(UserId::new(credentials.username.clone()))
        } else {
            tracing::debug!(username = %credentials.username, "Credential verification failed");
            Err(AuthError::InvalidCredentials)
        }
    }
}
