//! End-to-end processor behaviour over the in-memory harness.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use chrono::Duration;
use data_citation_auth::AuthError;
use data_citation_core::{FailureReason, PollOutcome, StateKind};
use data_citation_runtime::{ProcessorError, RequestStore, RetryPolicy, SweepConfig};
use data_citation_testing::resolver::Answer;
use data_citation_testing::{ScriptedResolver, TestHarness, init_test_tracing};
use tokio_test::{assert_err, assert_ok};

const FOUND: &str = "10.11570/18.0001";
const MISSING: &str = "10.11570/18.9999";

fn failed(reason: FailureReason) -> PollOutcome {
    PollOutcome::Failed { reason }
}

async fn until_idle(harness: &TestHarness) {
    for _ in 0..200 {
        if harness.processor.in_flight() == 0 {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("resolutions still running");
}

#[tokio::test]
async fn malformed_doi_fails_without_resolution() {
    init_test_tracing();
    let harness = TestHarness::builder().build();
    let token = harness.login("alice").await;

    let submission = assert_ok!(harness.processor.submit("99.9999", &token).await);

    assert_eq!(submission.state, StateKind::Failed);
    assert_eq!(
        assert_ok!(harness.processor.poll(submission.request_id, &token).await),
        failed(FailureReason::Malformed)
    );
    assert_eq!(harness.processor.in_flight(), 0);
    assert_eq!(harness.resolver.total_calls(), 0);

    let record = assert_ok!(harness.processor.request(submission.request_id, &token).await);
    assert_eq!(record.doi, "99.9999");
    assert_eq!(record.owner.as_str(), "alice");
}

#[tokio::test]
async fn registered_doi_succeeds_and_stays_succeeded() {
    let harness = TestHarness::builder()
        .resolver(ScriptedResolver::new().with_answers(FOUND, [Answer::Found]))
        .build();
    let token = harness.login("alice").await;

    let submission = assert_ok!(harness.processor.submit(FOUND, &token).await);
    assert_eq!(submission.state, StateKind::Pending);

    let outcome = harness.wait_for(submission.request_id, &token).await.unwrap();
    let PollOutcome::Succeeded { result } = &outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert!(!result.formatted.is_empty());
    assert!(result.formatted.ends_with("https://doi.org/10.11570/18.0001"));

    for _ in 0..3 {
        assert_eq!(
            assert_ok!(harness.processor.poll(submission.request_id, &token).await),
            outcome
        );
    }
}

#[tokio::test]
async fn unregistered_doi_is_not_found() {
    let harness = TestHarness::builder().build();
    let token = harness.login("alice").await;

    let submission = assert_ok!(harness.processor.submit(MISSING, &token).await);
    let outcome = harness.wait_for(submission.request_id, &token).await.unwrap();

    assert_eq!(outcome, failed(FailureReason::NotFound));
    assert_eq!(harness.resolver.calls(MISSING), 1);
}

#[tokio::test]
async fn unavailable_registry_exhausts_retry_budget() {
    let harness = TestHarness::builder()
        .resolver(ScriptedResolver::new().with_fallback(Answer::Unavailable))
        .retry(
            RetryPolicy::builder()
                .max_retries(2)
                .initial_delay(std::time::Duration::from_millis(1))
                .build(),
        )
        .build();
    let token = harness.login("alice").await;

    let submission = assert_ok!(harness.processor.submit(FOUND, &token).await);
    let outcome = harness.wait_for(submission.request_id, &token).await.unwrap();

    assert_eq!(outcome, failed(FailureReason::Unavailable));
    assert_eq!(harness.resolver.calls(FOUND), 3);
}

#[tokio::test]
async fn transient_failures_then_success() {
    let harness = TestHarness::builder()
        .resolver(ScriptedResolver::new().with_answers(
            FOUND,
            [Answer::Unavailable, Answer::Unavailable, Answer::Found],
        ))
        .build();
    let token = harness.login("alice").await;

    let submission = assert_ok!(harness.processor.submit(FOUND, &token).await);
    let outcome = harness.wait_for(submission.request_id, &token).await.unwrap();

    assert!(matches!(outcome, PollOutcome::Succeeded { .. }));
    assert_eq!(harness.resolver.calls(FOUND), 3);
}

#[tokio::test]
async fn pending_is_observable_while_resolving() {
    let harness = TestHarness::builder()
        .resolver(ScriptedResolver::new().held())
        .build();
    let token = harness.login("alice").await;

    let submission = assert_ok!(harness.processor.submit(MISSING, &token).await);
    assert_eq!(
        assert_ok!(harness.processor.poll(submission.request_id, &token).await),
        PollOutcome::Pending
    );

    harness.resolver.release(1);
    let outcome = harness.wait_for(submission.request_id, &token).await.unwrap();
    assert_eq!(outcome, failed(FailureReason::NotFound));
}

#[tokio::test]
async fn requests_are_private_to_their_owner() {
    let harness = TestHarness::builder().build();
    let alice = harness.login("alice").await;
    let bob = harness.login("bob").await;

    let submission = assert_ok!(harness.processor.submit("99.9999", &alice).await);
    let id = submission.request_id;

    assert_eq!(
        harness.processor.poll(id, &bob).await,
        Err(ProcessorError::Forbidden(id))
    );
    assert_eq!(
        harness.processor.request(id, &bob).await,
        Err(ProcessorError::Forbidden(id))
    );
    assert_eq!(
        harness.processor.delete(id, &bob).await,
        Err(ProcessorError::Forbidden(id))
    );
    assert!(assert_ok!(harness.processor.list(&bob).await).is_empty());
    assert_eq!(assert_ok!(harness.processor.list(&alice).await).len(), 1);
}

#[tokio::test]
async fn unauthenticated_calls_are_rejected() {
    let harness = TestHarness::builder().build();

    assert_eq!(
        harness.processor.submit(FOUND, "not-a-token").await,
        Err(ProcessorError::Authentication(AuthError::InvalidToken))
    );

    let token = harness.login("alice").await;
    assert_ok!(harness.gate().logout(&token).await);
    assert_eq!(
        harness.processor.list(&token).await,
        Err(ProcessorError::Authentication(AuthError::SessionNotFound))
    );
    assert!(harness.store.is_empty().unwrap());
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let harness = TestHarness::builder()
        .session_ttl(Duration::minutes(10))
        .build();
    let token = harness.login("alice").await;

    harness.clock.advance(Duration::minutes(11));

    assert_eq!(
        harness.processor.list(&token).await,
        Err(ProcessorError::Authentication(AuthError::SessionExpired))
    );
}

#[tokio::test]
async fn sweep_reclaims_sessions_nobody_comes_back_for() {
    let harness = TestHarness::builder()
        .session_ttl(Duration::minutes(10))
        .build();
    for _ in 0..50 {
        harness.login("alice").await;
    }
    assert_eq!(harness.sessions.session_count().unwrap(), 50);

    harness.clock.advance(Duration::days(30));
    let report = harness
        .sweeper(SweepConfig::default())
        .sweep_once()
        .await
        .unwrap();

    assert_eq!(report.sessions_expired, 50);
    assert_eq!(harness.sessions.session_count().unwrap(), 0);
}

#[tokio::test]
async fn deleting_a_pending_request_discards_the_late_result() {
    let harness = TestHarness::builder()
        .resolver(ScriptedResolver::new().held())
        .build();
    let token = harness.login("alice").await;

    let submission = assert_ok!(harness.processor.submit(MISSING, &token).await);
    assert_ok!(harness.processor.delete(submission.request_id, &token).await);

    harness.resolver.release(1);
    until_idle(&harness).await;

    assert_eq!(
        harness.processor.poll(submission.request_id, &token).await,
        Err(ProcessorError::NotFound(submission.request_id))
    );
    assert_eq!(harness.store.len().unwrap(), 0);
}

#[tokio::test]
async fn request_deleted_while_queued_never_reaches_the_registry() {
    let queued_doi = "10.11570/18.0002";
    let harness = TestHarness::builder()
        .resolver(ScriptedResolver::new().held())
        .max_concurrent_resolutions(1)
        .build();
    let token = harness.login("alice").await;

    assert_ok!(harness.processor.submit(MISSING, &token).await);
    for _ in 0..200 {
        if harness.resolver.total_calls() == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    assert_eq!(harness.resolver.total_calls(), 1);

    let queued = assert_ok!(harness.processor.submit(queued_doi, &token).await);
    tokio::task::yield_now().await;
    assert_ok!(harness.processor.delete(queued.request_id, &token).await);

    harness.resolver.release(2);
    until_idle(&harness).await;

    assert_eq!(harness.resolver.calls(queued_doi), 0);
    assert_eq!(harness.resolver.calls(MISSING), 1);
}

#[tokio::test]
async fn oversized_worker_budget_is_clamped() {
    let harness = TestHarness::builder()
        .resolver(ScriptedResolver::new().with_fallback(Answer::Found))
        .max_concurrent_resolutions(usize::MAX)
        .build();
    let token = harness.login("alice").await;

    let submission = assert_ok!(harness.processor.submit(FOUND, &token).await);
    let outcome = harness.wait_for(submission.request_id, &token).await.unwrap();

    assert!(matches!(outcome, PollOutcome::Succeeded { .. }));
    assert!(harness.processor.health().status.is_healthy());
}

#[tokio::test]
async fn timeout_sweep_wins_over_late_resolution() {
    let harness = TestHarness::builder()
        .resolver(ScriptedResolver::new().held().with_fallback(Answer::Found))
        .build();
    let token = harness.login("alice").await;
    let submission = assert_ok!(harness.processor.submit(FOUND, &token).await);

    harness.clock.advance(Duration::minutes(10));
    let report = harness
        .sweeper(SweepConfig::default().with_max_lifetime(Duration::minutes(5)))
        .sweep_once()
        .await
        .unwrap();
    assert_eq!(report.timed_out, 1);

    harness.resolver.release(1);
    until_idle(&harness).await;

    // Session was refreshed by `submit`; ten minutes is well inside the TTL
    assert_eq!(
        assert_ok!(harness.processor.poll(submission.request_id, &token).await),
        failed(FailureReason::Timeout)
    );
}

#[tokio::test]
async fn bounded_concurrency_still_completes_everything() {
    let harness = TestHarness::builder()
        .resolver(
            ScriptedResolver::new()
                .with_fallback(Answer::Found)
                .with_delay(std::time::Duration::from_millis(5)),
        )
        .max_concurrent_resolutions(2)
        .build();
    let token = harness.login("alice").await;

    let processor = &harness.processor;
    let token = token.as_str();
    let submissions = futures::future::join_all((0..12).map(|i| async move {
        let doi = format!("10.1000/item-{i}");
        processor.submit(&doi, token).await
    }))
    .await;

    for submission in submissions {
        let submission = submission.unwrap();
        let outcome = harness.wait_for(submission.request_id, token).await.unwrap();
        assert!(matches!(outcome, PollOutcome::Succeeded { .. }));
    }
    assert_eq!(harness.resolver.total_calls(), 12);
}

#[tokio::test]
async fn shutdown_drains_and_refuses_new_work() {
    let harness = TestHarness::builder()
        .resolver(ScriptedResolver::new().with_delay(std::time::Duration::from_millis(20)))
        .build();
    let token = harness.login("alice").await;
    assert_ok!(harness.processor.submit(MISSING, &token).await);

    assert_ok!(
        harness
            .processor
            .shutdown(std::time::Duration::from_secs(2))
            .await
    );
    assert_eq!(harness.processor.in_flight(), 0);

    assert_err!(harness.processor.submit(MISSING, &token).await);
    assert!(harness.processor.health().status.is_unhealthy());
}
