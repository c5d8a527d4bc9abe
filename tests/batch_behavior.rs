//! Behavior tests for the batch orchestrator: ordering, failure
//! aggregation, and cache reuse across rounds.

use std::sync::Arc;

use serde_json::json;
use satquery_tests::*;

use satquery_core::{Address, AssetTicker, BnsName};

fn addr() -> Address {
    Address::parse("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").expect("valid address")
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn when_all_calls_succeed_results_preserve_input_order() {
    // Given: three distinct operations with distinguishable payloads
    let transport = Arc::new(
        StubTransport::new()
            .route("summary", vec![envelope_ok(json!({"which": "summary"}))])
            .route("asset/ORDI/info", vec![envelope_ok(json!({"which": "asset"}))])
            .route("ns/name/alice", vec![envelope_ok(json!({"which": "name"}))]),
    );
    let client = client_over(Arc::clone(&transport));

    let calls = [
        BatchCall::AddressSummary(addr()),
        BatchCall::AssetInfo(AssetTicker::parse("ordi").expect("valid")),
        BatchCall::ResolveName(BnsName::parse("alice").expect("valid")),
    ];

    // When: the batch runs
    let results = client.batch(&calls).await.expect("batch succeeds");

    // Then: position-to-position correspondence with the input
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["which"], json!("summary"));
    assert_eq!(results[1]["which"], json!("asset"));
    assert_eq!(results[2]["which"], json!("name"));
}

// =============================================================================
// Failure aggregation
// =============================================================================

#[tokio::test]
async fn when_one_call_fails_batch_raises_one_error_naming_position_and_message() {
    // Given: the middle call is rejected by the protocol
    let transport = Arc::new(
        StubTransport::new()
            .route("summary", vec![envelope_ok(json!({"ok": 1}))])
            .route("ns/name/ghost", vec![envelope_err(12, "name not registered")])
            .route("balance", vec![envelope_ok(json!({"ok": 3}))]),
    );
    let client = client_over(Arc::clone(&transport));

    let calls = [
        BatchCall::AddressSummary(addr()),
        BatchCall::ResolveName(BnsName::parse("ghost").expect("valid")),
        BatchCall::AddressBalance(addr()),
    ];

    // When: the batch runs
    let error = client.batch(&calls).await.expect_err("batch fails");

    // Then: one aggregated error identifying the failing slot
    assert!(error.message().contains("1 of 3"));
    let detail = error.data().expect("failure listing").as_array().expect("array").clone();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0]["position"], json!(1));
    assert_eq!(detail[0]["code"], json!(12));
    assert!(detail[0]["message"]
        .as_str()
        .expect("message string")
        .contains("name not registered"));

    // And: siblings were not cancelled by the failure
    assert_eq!(transport.send_count(), 3);
}

#[tokio::test]
async fn when_several_calls_fail_every_failure_is_listed() {
    let transport = Arc::new(
        StubTransport::new()
            .route("summary", vec![status(500), status(500), status(500)])
            .route("ns/name/ghost", vec![envelope_err(12, "name not registered")])
            .route("balance", vec![envelope_ok(json!({"ok": 1}))]),
    );
    let client = client_over(Arc::clone(&transport));

    let calls = [
        BatchCall::AddressSummary(addr()),
        BatchCall::ResolveName(BnsName::parse("ghost").expect("valid")),
        BatchCall::AddressBalance(addr()),
    ];

    let error = client.batch(&calls).await.expect_err("batch fails");

    assert!(error.message().contains("2 of 3"));
    let detail = error.data().expect("failure listing").as_array().expect("array").clone();
    let positions = detail
        .iter()
        .map(|entry| entry["position"].as_u64().expect("position"))
        .collect::<Vec<_>>();
    assert_eq!(positions, vec![0, 1]);
}

// =============================================================================
// Cache reuse
// =============================================================================

#[tokio::test]
async fn when_a_batch_repeats_the_second_round_is_served_from_cache() {
    let transport = Arc::new(
        StubTransport::new()
            .route("summary", vec![envelope_ok(json!({"n": 1}))])
            .route("utxo", vec![envelope_ok(json!([]))]),
    );
    let client = client_over(Arc::clone(&transport));

    let calls = [
        BatchCall::AddressSummary(addr()),
        BatchCall::AddressUtxos(addr()),
    ];

    let first = client.batch(&calls).await.expect("first round");
    let second = client.batch(&calls).await.expect("second round");

    assert_eq!(first, second);
    assert_eq!(transport.send_count(), 2);

    let metrics = client.metrics().await;
    assert_eq!(metrics.cache_hits, 2);
}

#[tokio::test]
async fn when_batch_is_empty_result_is_empty() {
    let transport = Arc::new(StubTransport::new());
    let client = client_over(Arc::clone(&transport));

    let results = client.batch(&[]).await.expect("empty batch");
    assert!(results.is_empty());
    assert_eq!(transport.send_count(), 0);
}
