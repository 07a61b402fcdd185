//! Replays the published contract fixtures against the usecases.
//!
//! `contracts/http/tracking/` is what the harness asserts over the wire; these
//! tests replay the same request bodies in-process so a handler change that
//! breaks the published contract fails here first, without Docker.

use axum::body::to_bytes;
use axum::response::IntoResponse;
use serde_json::Value;

use rastro_domain::normalize::RawUserData;
use rastro_testing::fixture;
use rastro_tracking::domain::types::EventSource;
use rastro_tracking::error::TrackingServiceError;
use rastro_tracking::usecase::record::{NamedEventInput, PurchaseInput, RecordOutcome};

use crate::helpers::{MockAttributionStore, MockConversions, MockDedupRepo, named_usecase, purchase_usecase};

// ── Fixture plumbing ─────────────────────────────────────────────────────────

fn purchase_input_from(body: &Value) -> PurchaseInput {
    PurchaseInput {
        transaction_id: body["transaction_id"].as_str().map(str::to_owned),
        value: body["value"].as_f64(),
        currency: body["currency"].as_str().map(str::to_owned),
        source: EventSource::Capi,
        visitor_id: body["visitor_id"].as_str().map(str::to_owned),
        event_source_url: body["event_source_url"].as_str().map(str::to_owned),
        user: raw_user_from(body),
        fbp: None,
        fbc: None,
        ip_address: None,
        user_agent: None,
        event_time: body["event_time"].as_i64(),
    }
}

fn named_input_from(body: &Value) -> NamedEventInput {
    NamedEventInput {
        event_name: body["event_name"].as_str().unwrap_or_default().to_owned(),
        user_id: body["user_id"].as_str().map(str::to_owned),
        timestamp_ms: body["timestamp_ms"].as_i64(),
        value: body["value"].as_f64(),
        currency: body["currency"].as_str().map(str::to_owned),
        source: EventSource::Capi,
        visitor_id: body["visitor_id"].as_str().map(str::to_owned),
        event_source_url: body["event_source_url"].as_str().map(str::to_owned),
        user: raw_user_from(body),
        fbp: None,
        fbc: None,
        ip_address: None,
        user_agent: None,
        event_time: body["event_time"].as_i64(),
    }
}

fn raw_user_from(body: &Value) -> RawUserData {
    serde_json::from_value(body["user"].clone()).unwrap_or_default()
}

fn assert_outcome_matches(outcome: &RecordOutcome, expected: &Value, id: &str) {
    assert_eq!(
        outcome.event_id,
        expected["event_id"].as_str().unwrap(),
        "event_id drifted from fixture {id}"
    );
    assert_eq!(
        outcome.deduplicated,
        expected["deduplicated"].as_bool().unwrap(),
        "deduplicated drifted from fixture {id}"
    );
    assert_eq!(
        outcome.dispatched,
        expected["dispatched"].as_bool().unwrap(),
        "dispatched drifted from fixture {id}"
    );
}

async fn rendered(error: TrackingServiceError) -> (u16, Value) {
    let resp = error.into_response();
    let status = resp.status().as_u16();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ── Contracts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_match_the_purchase_report_contract() {
    let first = fixture::contract("tracking", "030-purchase-report");
    let replay = fixture::contract("tracking", "035-purchase-duplicate");

    let uc = purchase_usecase(
        MockDedupRepo::empty(),
        MockConversions::ok(),
        MockAttributionStore::empty(),
    );

    let outcome = uc
        .execute(purchase_input_from(&fixture::request_body(&first)))
        .await
        .unwrap();
    assert_outcome_matches(&outcome, &fixture::expected_body(&first), "030");

    let outcome = uc
        .execute(purchase_input_from(&fixture::request_body(&replay)))
        .await
        .unwrap();
    assert_outcome_matches(&outcome, &fixture::expected_body(&replay), "035");
}

#[tokio::test]
async fn should_match_the_named_event_contract() {
    let first = fixture::contract("tracking", "040-named-event");
    let replay = fixture::contract("tracking", "045-named-event-duplicate");

    let uc = named_usecase(
        MockDedupRepo::empty(),
        MockConversions::ok(),
        MockAttributionStore::empty(),
    );

    let outcome = uc
        .execute(named_input_from(&fixture::request_body(&first)))
        .await
        .unwrap();
    assert_outcome_matches(&outcome, &fixture::expected_body(&first), "040");

    let outcome = uc
        .execute(named_input_from(&fixture::request_body(&replay)))
        .await
        .unwrap();
    assert_outcome_matches(&outcome, &fixture::expected_body(&replay), "045");
}

#[tokio::test]
async fn should_match_the_invalid_event_contract() {
    let contract = fixture::contract("tracking", "075-invalid-event");

    let uc = named_usecase(
        MockDedupRepo::empty(),
        MockConversions::ok(),
        MockAttributionStore::empty(),
    );
    let error = uc
        .execute(named_input_from(&fixture::request_body(&contract)))
        .await
        .unwrap_err();

    let (status, body) = rendered(error).await;
    assert_eq!(u64::from(status), contract["expect"]["status"].as_u64().unwrap());
    assert_eq!(body, fixture::expected_body(&contract));
}

#[tokio::test]
async fn should_match_the_not_found_contracts() {
    let event = fixture::contract("tracking", "065-audit-missing");
    let (status, body) = rendered(TrackingServiceError::EventNotFound).await;
    assert_eq!(u64::from(status), event["expect"]["status"].as_u64().unwrap());
    assert_eq!(body, fixture::expected_body(&event));

    let touch = fixture::contract("tracking", "070-attribution-missing");
    let (status, body) = rendered(TrackingServiceError::TouchNotFound).await;
    assert_eq!(u64::from(status), touch["expect"]["status"].as_u64().unwrap());
    assert_eq!(body, fixture::expected_body(&touch));
}
