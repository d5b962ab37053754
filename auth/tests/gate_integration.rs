//! Integration tests for the access gate.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use data_citation_auth::{
    AccessGate, AuthError, Credentials, InMemorySessionStore, SessionConfig, SessionStore,
    StaticCredentialVerifier,
};
use data_citation_core::SystemClock;
use std::sync::Arc;

fn gate_with_store() -> (AccessGate, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::new());
    let verifier = StaticCredentialVerifier::parse("alice:secret,bob:hunter2").unwrap();
    let gate = AccessGate::new(
        store.clone(),
        Arc::new(verifier),
        Arc::new(SystemClock),
        SessionConfig::default(),
    );
    (gate, store)
}

#[tokio::test]
async fn login_authorize_logout_round() {
    let (gate, store) = gate_with_store();

    let session = gate
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap();
    let token = session.session_id.to_string();
    assert_eq!(store.session_count().unwrap(), 1);

    assert_eq!(gate.authorize(&token).await.unwrap().user_id.as_str(), "alice");

    gate.logout(&token).await.unwrap();
    assert_eq!(store.session_count().unwrap(), 0);
    assert_eq!(
        gate.authorize(&token).await,
        Err(AuthError::SessionNotFound)
    );
}

#[tokio::test]
async fn logout_twice_succeeds() {
    let (gate, _) = gate_with_store();
    let token = gate
        .login(&Credentials::new("bob", "hunter2"))
        .await
        .unwrap()
        .session_id
        .to_string();

    gate.logout(&token).await.unwrap();
    gate.logout(&token).await.unwrap();
}

#[tokio::test]
async fn wrong_password_opens_no_session() {
    let (gate, store) = gate_with_store();

    let result = gate.login(&Credentials::new("alice", "nope")).await;

    assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    assert_eq!(store.session_count().unwrap(), 0);
}

#[tokio::test]
async fn sessions_are_per_user() {
    let (gate, store) = gate_with_store();

    let alice = gate
        .login(&Credentials::new("alice", "secret"))
        .await
        .unwrap();
    let bob = gate
        .login(&Credentials::new("bob", "hunter2"))
        .await
        .unwrap();

    assert_ne!(alice.session_id, bob.session_id);
    let stored = store.get_session(bob.session_id).await.unwrap();
    assert_eq!(stored.user_id.as_str(), "bob");
}
