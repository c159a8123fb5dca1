mod common;

use common::{donation, receipt, verified, InMemoryStore, ScriptedChain};
use donation_verifier::error::{UpstreamError, VerificationError};
use donation_verifier::models::{PaymentStatus, VerificationRecord, VerificationState};
use donation_verifier::services::VerificationOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn setup() -> (Arc<InMemoryStore>, Arc<ScriptedChain>, Arc<VerificationOrchestrator>) {
    let store = Arc::new(InMemoryStore::new());
    let chain = Arc::new(ScriptedChain::new());
    let orchestrator = Arc::new(VerificationOrchestrator::new(store.clone(), chain.clone()));
    (store, chain, orchestrator)
}

#[tokio::test]
async fn submits_unsubmitted_donation_and_persists_proof() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    chain.on_submit("d1", Ok(receipt("0xabc", 42)));

    let record = assert_ok!(orchestrator.verify_one("d1").await);

    assert_eq!(record.state(), VerificationState::Verified);
    assert_eq!(record.block_number, 42);
    assert_eq!(store.stored_verification("d1"), Some(record));
    assert_eq!(chain.submit_calls(), 1);
}

#[tokio::test]
async fn verified_donation_is_returned_without_chain_call() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    let existing = verified("d1", "0xabc", 42);
    store.insert_verification(existing.clone());

    let first = assert_ok!(orchestrator.verify_one("d1").await);
    let second = assert_ok!(orchestrator.verify_one("d1").await);

    assert_eq!(first, existing);
    assert_eq!(second, existing);
    assert_eq!(chain.submit_calls(), 0);
    assert_eq!(chain.confirmation_calls(), 0);
}

#[tokio::test]
async fn only_succeeded_payments_can_be_verified() {
    let (store, chain, orchestrator) = setup();
    for (id, status) in [
        ("pending", PaymentStatus::Pending),
        ("processing", PaymentStatus::Processing),
        ("failed", PaymentStatus::Failed),
        ("refunded", PaymentStatus::Refunded),
    ] {
        let mut d = donation(id, "u1", "c1", 10.0);
        d.payment_status = status;
        store.insert_donation(d);

        let err = assert_err!(orchestrator.verify_one(id).await);
        assert!(matches!(err, VerificationError::InvalidState(_)), "{:?}", err);
        assert_eq!(store.stored_verification(id), None);
    }
    assert_eq!(chain.submit_calls(), 0);
}

#[tokio::test]
async fn unknown_donation_is_not_found() {
    let (_store, chain, orchestrator) = setup();

    let err = assert_err!(orchestrator.verify_one("missing").await);

    assert!(matches!(err, VerificationError::NotFound(_)));
    assert_eq!(chain.submit_calls(), 0);
}

#[tokio::test]
async fn unmined_receipt_is_stored_as_pending() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    chain.on_submit("d1", Ok(receipt("0xdef", 0)));

    let record = assert_ok!(orchestrator.verify_one("d1").await);

    assert_eq!(record.state(), VerificationState::Pending);
    assert_eq!(record.transaction_hash.as_deref(), Some("pending_0xdef"));
    assert_eq!(record.submitted_hash(), Some("0xdef"));
}

#[tokio::test]
async fn pending_record_is_refreshed_not_resubmitted() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    store.insert_verification(VerificationRecord::pending("d1", "0xdef"));

    // Not mined yet: the record comes back unchanged.
    let still_pending = assert_ok!(orchestrator.verify_one("d1").await);
    assert_eq!(still_pending.state(), VerificationState::Pending);

    chain.confirm("0xdef", receipt("0xdef", 77));
    let confirmed = assert_ok!(orchestrator.verify_one("d1").await);

    assert_eq!(confirmed.state(), VerificationState::Verified);
    assert_eq!(confirmed.transaction_hash.as_deref(), Some("0xdef"));
    assert_eq!(confirmed.block_number, 77);
    assert_eq!(store.stored_verification("d1"), Some(confirmed));
    assert_eq!(chain.submit_calls(), 0);
    assert_eq!(chain.confirmation_calls(), 2);
}

#[tokio::test]
async fn rejected_submission_records_failure_and_can_be_resubmitted() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    chain.on_submit("d1", Err(UpstreamError::Remote("contract reverted".to_string())));

    let err = assert_err!(orchestrator.verify_one("d1").await);
    assert!(matches!(err, VerificationError::Remote(_)));

    let failed = store.stored_verification("d1").expect("failure recorded");
    assert_eq!(failed.state(), VerificationState::Failed);
    assert_eq!(failed.transaction_hash.as_deref(), Some("failed_d1"));

    chain.on_submit("d1", Ok(receipt("0xabc", 5)));
    let record = assert_ok!(orchestrator.verify_one("d1").await);
    assert_eq!(record.state(), VerificationState::Verified);
    assert_eq!(chain.submit_calls(), 2);
}

#[tokio::test]
async fn network_failure_on_submit_records_nothing() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    chain.on_submit("d1", Err(UpstreamError::Network("connection reset".to_string())));

    let err = assert_err!(orchestrator.verify_one("d1").await);

    assert!(err.is_retryable());
    assert_eq!(store.stored_verification("d1"), None);
    assert_eq!(chain.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn persist_is_retried_without_resubmitting() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    store.fail_next_saves(vec![
        UpstreamError::Network("503".to_string()),
        UpstreamError::Network("503".to_string()),
    ]);

    let record = assert_ok!(orchestrator.verify_one("d1").await);

    assert_eq!(record.state(), VerificationState::Verified);
    assert_eq!(store.stored_verification("d1"), Some(record));
    assert_eq!(chain.submit_calls(), 1);
}

#[tokio::test]
async fn verify_many_settles_every_item() {
    let (store, chain, orchestrator) = setup();
    for id in ["a", "b", "c"] {
        store.insert_donation(donation(id, "u1", "c1", 10.0));
    }
    chain.on_submit("b", Err(UpstreamError::Remote("rejected".to_string())));

    let result = orchestrator
        .verify_many(["a", "b", "c", "a"].map(String::from))
        .await;

    assert_eq!(result.successful, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.total, 3);
    let failures: Vec<_> = result.failures().map(|(id, _)| id.to_string()).collect();
    assert_eq!(failures, vec!["b".to_string()]);

    assert_eq!(
        store.stored_verification("a").map(|r| r.state()),
        Some(VerificationState::Verified)
    );
    assert_eq!(
        store.stored_verification("c").map(|r| r.state()),
        Some(VerificationState::Verified)
    );
    assert_eq!(chain.submit_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn detached_verification_outlives_the_caller() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    chain.slow(Duration::from_secs(60));

    let err = assert_err!(
        orchestrator
            .verify_detached("d1", Duration::from_secs(5))
            .await
    );
    assert_eq!(err, VerificationError::TimedOut(Duration::from_secs(5)));
    assert_eq!(store.stored_verification("d1"), None);

    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(
        store.stored_verification("d1").map(|r| r.state()),
        Some(VerificationState::Verified)
    );
    assert_eq!(chain.submit_calls(), 1);
}

#[tokio::test]
async fn detached_verification_returns_fast_results() {
    let (store, _chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));

    let record = assert_ok!(
        orchestrator
            .verify_detached("d1", Duration::from_secs(5))
            .await
    );

    assert_eq!(record.state(), VerificationState::Verified);
}

#[tokio::test(start_paused = true)]
async fn concurrent_verifications_submit_once() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    chain.slow(Duration::from_secs(10));

    let (first, second) = tokio::join!(
        orchestrator.verify_one("d1"),
        orchestrator.verify_one("d1")
    );

    let first = assert_ok!(first);
    let second = assert_ok!(second);
    assert_eq!(first, second);
    assert_eq!(first.state(), VerificationState::Verified);
    assert_eq!(chain.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_after_timeout_waits_for_the_running_submission() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    chain.slow(Duration::from_secs(10));

    let err = assert_err!(
        orchestrator
            .verify_detached("d1", Duration::from_secs(5))
            .await
    );
    assert_eq!(err, VerificationError::TimedOut(Duration::from_secs(5)));

    let record = assert_ok!(
        orchestrator
            .verify_detached("d1", Duration::from_secs(30))
            .await
    );

    assert_eq!(record.state(), VerificationState::Verified);
    assert_eq!(chain.submit_calls(), 1);
}

#[tokio::test]
async fn pending_record_without_hash_is_left_alone() {
    let (store, chain, orchestrator) = setup();
    store.insert_donation(donation("d1", "u1", "c1", 25.0));
    chain.on_submit("d1", Ok(receipt("", 0)));

    let pending = assert_ok!(orchestrator.verify_one("d1").await);
    assert_eq!(pending.transaction_hash.as_deref(), Some("pending_"));

    let again = assert_ok!(orchestrator.verify_one("d1").await);

    assert_eq!(again, pending);
    assert_eq!(chain.submit_calls(), 1);
    assert_eq!(chain.confirmation_calls(), 0);
}
