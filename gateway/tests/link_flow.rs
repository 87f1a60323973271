//! Integration tests for the link submission flow.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use idmap_gateway::{
    config::{MapperConfig, PollPolicy},
    error::MapperError,
    mocks::{MockMapperEndpoint, MockStatusStore},
    models::{
        LinkCallbackRequest, LinkStatusReasonCode, MapperAction, MapperValue, RequestStatus,
        SingleLinkCallbackRequest, SingleTxnRefStatus, TxnStatus,
    },
    services::{BlockingLinkService, LinkService},
};

/// Create a link service over scripted mocks, handing back the mock
/// handles for assertions.
fn create_test_service(
    endpoint: MockMapperEndpoint,
) -> (
    LinkService<MockMapperEndpoint, MockStatusStore>,
    MockMapperEndpoint,
    MockStatusStore,
) {
    let store = MockStatusStore::new();
    let service = LinkService::new(endpoint.clone(), store.clone(), MapperConfig::default());
    (service, endpoint, store)
}

/// Create a batch of distinct mapping values.
fn create_test_mappings(count: usize) -> Vec<MapperValue> {
    (0..count)
        .map(|i| MapperValue {
            id: Some(format!("token-{i}")),
            fa: Some(format!("acct-{i}@bank")),
            name: Some(format!("Person {i}")),
            phone_number: None,
        })
        .collect()
}

/// Poll `condition` every 10ms until it holds, for at most one second.
async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Store a received record under `txn_id` with the given reference ids.
fn seed_record(store: &MockStatusStore, txn_id: &str, reference_ids: &[&str]) {
    let refs: HashMap<_, _> = reference_ids
        .iter()
        .map(|reference_id| {
            let mapping = MapperValue {
                id: Some(format!("token-{reference_id}")),
                fa: Some(format!("{reference_id}@bank")),
                ..MapperValue::default()
            };
            (
                (*reference_id).to_string(),
                SingleTxnRefStatus::received((*reference_id).to_string(), &mapping),
            )
        })
        .collect();
    store.store_directly(TxnStatus::received(txn_id.to_string(), refs));
}

/// Build a callback carrying one outcome per reference id.
fn link_callback(txn_id: &str, outcomes: &[(&str, RequestStatus)]) -> LinkCallbackRequest {
    LinkCallbackRequest {
        transaction_id: txn_id.to_string(),
        correlation_id: None,
        link_response: outcomes
            .iter()
            .map(|(reference_id, status)| SingleLinkCallbackRequest {
                reference_id: (*reference_id).to_string(),
                timestamp: Utc::now(),
                fa: format!("{reference_id}@bank"),
                status: *status,
                status_reason_code: None,
                status_reason_message: None,
                additional_info: None,
                locale: None,
            })
            .collect(),
        meta: None,
    }
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_submit_returns_received_snapshot() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::acking());

    let status = service
        .submit(&create_test_mappings(2), Some("txn-link-1".to_string()))
        .await
        .unwrap();

    // The caller gets the rcvd snapshot immediately.
    assert_eq!(status.txn_id, "txn-link-1");
    assert_eq!(status.status, RequestStatus::Rcvd);
    assert_eq!(status.refs.len(), 2);
    assert!(status
        .refs
        .values()
        .all(|r| r.status == RequestStatus::Rcvd));

    // The initial record was persisted before dispatch.
    assert!(store.stored("txn-link-1").is_some());
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_ack_marks_all_references_pending() {
    let (service, endpoint, store) = create_test_service(MockMapperEndpoint::acking());

    service
        .submit(&create_test_mappings(3), Some("txn-link-1".to_string()))
        .await
        .unwrap();

    wait_until(|| {
        store
            .stored("txn-link-1")
            .is_some_and(|s| s.status == RequestStatus::Pdng)
    })
    .await;

    let stored = store.stored("txn-link-1").unwrap();
    assert_eq!(stored.status, RequestStatus::Pdng);
    assert_eq!(stored.refs.len(), 3);
    assert!(stored.refs.values().all(|r| r.status == RequestStatus::Pdng));

    // Exactly one dispatch, exactly two writes (initial + outcome).
    assert_eq!(endpoint.request_count(), 1);
    assert_eq!(
        endpoint.requests(),
        vec![(MapperAction::Link, "txn-link-1".to_string())]
    );
    assert_eq!(store.put_count(), 2);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_nack_rejects_batch() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::nacking());

    service
        .submit(&create_test_mappings(2), Some("txn-link-1".to_string()))
        .await
        .unwrap();

    wait_until(|| {
        store
            .stored("txn-link-1")
            .is_some_and(|s| s.status == RequestStatus::Rjct)
    })
    .await;

    let stored = store.stored("txn-link-1").unwrap();
    assert_eq!(stored.status, RequestStatus::Rjct);
    assert!(stored.refs.values().all(|r| r.status == RequestStatus::Rjct));
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_http_error_rejects_batch() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::returning_status(500));

    service
        .submit(&create_test_mappings(1), Some("txn-link-1".to_string()))
        .await
        .unwrap();

    wait_until(|| {
        store
            .stored("txn-link-1")
            .is_some_and(|s| s.status == RequestStatus::Rjct)
    })
    .await;

    assert_eq!(
        store.stored("txn-link-1").unwrap().status,
        RequestStatus::Rjct
    );
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_connect_error_rejects_batch() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::refusing_connections());

    service
        .submit(&create_test_mappings(1), Some("txn-link-1".to_string()))
        .await
        .unwrap();

    wait_until(|| {
        store
            .stored("txn-link-1")
            .is_some_and(|s| s.status == RequestStatus::Rjct)
    })
    .await;

    assert_eq!(
        store.stored("txn-link-1").unwrap().status,
        RequestStatus::Rjct
    );
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_timeout_leaves_record_received() {
    let (service, endpoint, store) = create_test_service(MockMapperEndpoint::timing_out());

    service
        .submit(&create_test_mappings(2), Some("txn-link-1".to_string()))
        .await
        .unwrap();

    // Wait for the dispatch to run, then give it time to (not) write.
    wait_until(|| endpoint.request_count() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // A timed-out link stays rcvd so a late callback can still land.
    let stored = store.stored("txn-link-1").unwrap();
    assert_eq!(stored.status, RequestStatus::Rcvd);
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_empty_batch_succeeds_without_dispatch() {
    let (service, endpoint, store) = create_test_service(MockMapperEndpoint::acking());

    let status = service
        .submit(&[], Some("txn-link-1".to_string()))
        .await
        .unwrap();

    // The caller sees succ, nothing went over the wire.
    assert_eq!(status.status, RequestStatus::Succ);
    assert!(status.refs.is_empty());
    assert_eq!(endpoint.request_count(), 0);

    // The persisted record keeps the rcvd it was written with.
    assert_eq!(
        store.stored("txn-link-1").unwrap().status,
        RequestStatus::Rcvd
    );
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_submit_and_wait_returns_dispatch_rejection() {
    let (service, endpoint, store) = create_test_service(MockMapperEndpoint::nacking());
    let poll = PollPolicy::new()
        .with_interval(Duration::ZERO)
        .with_max_attempts(3);

    let status = service
        .submit_and_wait(
            &create_test_mappings(2),
            Some("txn-link-1".to_string()),
            &poll,
        )
        .await
        .unwrap();

    // Inline dispatch persisted rjct; the first poll returned it.
    assert_eq!(status.status, RequestStatus::Rjct);
    assert_eq!(endpoint.request_count(), 1);
    assert_eq!(store.put_count(), 2);
    assert_eq!(store.get_count(), 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_submit_and_wait_completes_on_callback() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::acking());

    // Simulate the callback handler completing the transaction while
    // the submitter is still polling.
    let completer = store.clone();
    tokio::spawn(async move {
        wait_until(|| {
            completer
                .stored("txn-link-1")
                .is_some_and(|s| s.status == RequestStatus::Pdng)
        })
        .await;
        let mut completed = completer.stored("txn-link-1").unwrap();
        completed.set_all_statuses(RequestStatus::Succ);
        completer.store_directly(completed);
    });

    let poll = PollPolicy::new()
        .with_interval(Duration::from_millis(10))
        .with_max_attempts(100);
    let status = service
        .submit_and_wait(
            &create_test_mappings(2),
            Some("txn-link-1".to_string()),
            &poll,
        )
        .await
        .unwrap();

    assert_eq!(status.status, RequestStatus::Succ);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_submit_and_wait_exhausts_poll_budget() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::acking());
    let poll = PollPolicy::new()
        .with_interval(Duration::ZERO)
        .with_max_attempts(3);

    // An ACK without a callback never turns terminal.
    let err = service
        .submit_and_wait(
            &create_test_mappings(1),
            Some("txn-link-1".to_string()),
            &poll,
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        MapperError::RetriesExhausted {
            action: MapperAction::Link
        }
    );
    assert_eq!(err.code(), Some("G2P-MAP-100"));
    assert_eq!(store.get_count(), 3);

    // The transaction is not cancelled; a late callback can still land.
    assert_eq!(
        store.stored("txn-link-1").unwrap().status,
        RequestStatus::Pdng
    );
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_submit_and_wait_errors_when_record_vanishes() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::timing_out());

    // Expire the record out from under the poller.
    let reaper = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        reaper.remove("txn-link-1");
    });

    let poll = PollPolicy::new()
        .with_interval(Duration::from_millis(10))
        .with_max_attempts(100);
    let err = service
        .submit_and_wait(
            &create_test_mappings(1),
            Some("txn-link-1".to_string()),
            &poll,
        )
        .await
        .unwrap_err();

    assert_eq!(err, MapperError::TransactionNotFound("txn-link-1".to_string()));
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_apply_callback_mixed_outcomes() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::acking());
    seed_record(&store, "txn-link-1", &["ref-1", "ref-2", "ref-3"]);

    // Step 1: two of three references report back.
    let status = service
        .apply_callback(&link_callback(
            "txn-link-1",
            &[
                ("ref-1", RequestStatus::Succ),
                ("ref-2", RequestStatus::Rjct),
            ],
        ))
        .await
        .unwrap();

    // ref-3 is still rcvd, so the aggregate stays pending.
    assert_eq!(status.status, RequestStatus::Pdng);
    assert_eq!(status.refs["ref-1"].status, RequestStatus::Succ);
    assert_eq!(status.refs["ref-2"].status, RequestStatus::Rjct);
    assert_eq!(status.refs["ref-3"].status, RequestStatus::Rcvd);

    // Step 2: the straggler reports; one rejection taints the batch.
    let status = service
        .apply_callback(&link_callback(
            "txn-link-1",
            &[("ref-3", RequestStatus::Succ)],
        ))
        .await
        .unwrap();

    assert_eq!(status.status, RequestStatus::Rjct);
    assert_eq!(store.stored("txn-link-1").unwrap().status, RequestStatus::Rjct);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_apply_callback_all_success() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::acking());
    seed_record(&store, "txn-link-1", &["ref-1", "ref-2"]);

    let status = service
        .apply_callback(&link_callback(
            "txn-link-1",
            &[
                ("ref-1", RequestStatus::Succ),
                ("ref-2", RequestStatus::Succ),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(status.status, RequestStatus::Succ);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_apply_callback_skips_unknown_reference() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::acking());
    seed_record(&store, "txn-link-1", &["ref-1"]);

    let status = service
        .apply_callback(&link_callback(
            "txn-link-1",
            &[
                ("ref-unknown", RequestStatus::Succ),
                ("ref-1", RequestStatus::Succ),
            ],
        ))
        .await
        .unwrap();

    // The stray reference is ignored, the known one is applied.
    assert_eq!(status.refs.len(), 1);
    assert_eq!(status.refs["ref-1"].status, RequestStatus::Succ);
    assert_eq!(status.status, RequestStatus::Succ);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_apply_callback_unknown_transaction() {
    let (service, _, _) = create_test_service(MockMapperEndpoint::acking());

    let err = service
        .apply_callback(&link_callback("txn-missing", &[]))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        MapperError::TransactionNotFound("txn-missing".to_string())
    );
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_apply_callback_persists_once() {
    let (service, _, store) = create_test_service(MockMapperEndpoint::acking());
    seed_record(&store, "txn-link-1", &["ref-1"]);
    let before = store.put_count();

    service
        .apply_callback(&link_callback(
            "txn-link-1",
            &[("ref-1", RequestStatus::Succ)],
        ))
        .await
        .unwrap();

    assert_eq!(store.put_count(), before + 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_callback_reason_codes_round_trip() {
    // Wire-shape check on the callback payload the mapper sends.
    let json = serde_json::json!({
        "transaction_id": "txn-link-1",
        "link_response": [{
            "reference_id": "ref-1",
            "timestamp": "2024-01-15T10:00:00Z",
            "fa": "acct-1@bank",
            "status": "rjct",
            "status_reason_code": "rjct.fa.invalid"
        }]
    });

    let callback: LinkCallbackRequest = serde_json::from_value(json).unwrap();
    assert_eq!(callback.link_response[0].status, RequestStatus::Rjct);
    assert_eq!(
        callback.link_response[0].status_reason_code,
        Some(LinkStatusReasonCode::RjctFaInvalid)
    );
}

// ════════════════════════════════════════════════════════════════════
// Blocking variant
// ════════════════════════════════════════════════════════════════════

#[test]
#[allow(clippy::unwrap_used)]
fn test_blocking_submit_reflects_ack() {
    let endpoint = MockMapperEndpoint::acking();
    let store = MockStatusStore::new();
    let service =
        BlockingLinkService::new(endpoint.clone(), store.clone(), MapperConfig::default());

    let status = service
        .submit(&create_test_mappings(2), Some("txn-link-1".to_string()))
        .unwrap();

    // Dispatch ran inline, so the returned record is already pdng.
    assert_eq!(status.status, RequestStatus::Pdng);
    assert_eq!(
        store.stored("txn-link-1").unwrap().status,
        RequestStatus::Pdng
    );
    assert_eq!(endpoint.request_count(), 1);
    assert_eq!(store.put_count(), 2);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_blocking_submit_timeout_leaves_received() {
    let endpoint = MockMapperEndpoint::timing_out();
    let store = MockStatusStore::new();
    let service =
        BlockingLinkService::new(endpoint, store.clone(), MapperConfig::default());

    let status = service
        .submit(&create_test_mappings(1), Some("txn-link-1".to_string()))
        .unwrap();

    assert_eq!(status.status, RequestStatus::Rcvd);
    assert_eq!(
        store.stored("txn-link-1").unwrap().status,
        RequestStatus::Rcvd
    );
    assert_eq!(store.put_count(), 1);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_blocking_submit_and_wait_returns_rejection() {
    let endpoint = MockMapperEndpoint::nacking();
    let store = MockStatusStore::new();
    let service = BlockingLinkService::new(endpoint, store, MapperConfig::default());
    let poll = PollPolicy::new()
        .with_interval(Duration::ZERO)
        .with_max_attempts(3);

    let status = service
        .submit_and_wait(
            &create_test_mappings(1),
            Some("txn-link-1".to_string()),
            &poll,
        )
        .unwrap();

    assert_eq!(status.status, RequestStatus::Rjct);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_blocking_empty_batch_succeeds_without_dispatch() {
    let endpoint = MockMapperEndpoint::acking();
    let store = MockStatusStore::new();
    let service =
        BlockingLinkService::new(endpoint.clone(), store.clone(), MapperConfig::default());
    let poll = PollPolicy::new().with_max_attempts(1);

    let status = service
        .submit_and_wait(&[], Some("txn-link-1".to_string()), &poll)
        .unwrap();

    // No dispatch and no polling; the local succ is returned as-is.
    assert_eq!(status.status, RequestStatus::Succ);
    assert_eq!(endpoint.request_count(), 0);
    assert_eq!(store.get_count(), 0);
}
