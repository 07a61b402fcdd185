use chrono::{Duration, Utc};

use rastro_tracking::domain::types::{EventSource, PurgeCadence};
use rastro_tracking::usecase::record::{PurchaseInput, RecordPurchaseUseCase};

use crate::helpers::{
    MockAttributionStore, MockConversions, MockDedupRepo, dedup_record, purchase_input,
    purchase_usecase, touch_with,
};

#[tokio::test]
async fn should_record_and_dispatch_first_purchase() {
    let dedup = MockDedupRepo::empty();
    let rows = dedup.rows_handle();
    let conversions = MockConversions::ok();
    let sent = conversions.sent_handle();

    let uc = purchase_usecase(dedup, conversions, MockAttributionStore::empty());
    let outcome = uc.execute(purchase_input(Some("TX-1001"))).await.unwrap();

    assert_eq!(outcome.event_id, "pur:TX-1001");
    assert!(!outcome.deduplicated);
    assert!(outcome.dispatched);

    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_id, "pur:TX-1001");
    assert_eq!(rows[0].transaction_id, "TX-1001");
    assert_eq!(rows[0].source, EventSource::Capi);
    assert_eq!(rows[0].currency, "BRL", "currency should default to BRL");
    assert!(rows[0].expires_at > rows[0].created_at);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event_id, "pur:TX-1001");
    assert_eq!(sent[0].value, Some(297.0));
}

#[tokio::test]
async fn should_suppress_dispatch_for_duplicate_event_id() {
    let dedup = MockDedupRepo::with_rows(vec![dedup_record("pur:TX-1001", "TX-1001")]);
    let conversions = MockConversions::ok();
    let sent = conversions.sent_handle();

    let uc = purchase_usecase(dedup, conversions, MockAttributionStore::empty());
    let outcome = uc.execute(purchase_input(Some("TX-1001"))).await.unwrap();

    assert!(outcome.deduplicated);
    assert!(!outcome.dispatched);
    assert!(
        sent.lock().unwrap().is_empty(),
        "duplicate must not reach the conversions api"
    );
}

#[tokio::test]
async fn should_report_dispatch_failure_without_http_error() {
    let dedup = MockDedupRepo::empty();
    let rows = dedup.rows_handle();

    let uc = purchase_usecase(dedup, MockConversions::failing(), MockAttributionStore::empty());
    let outcome = uc.execute(purchase_input(Some("TX-1002"))).await.unwrap();

    assert!(!outcome.deduplicated);
    assert!(!outcome.dispatched, "failed dispatch reports dispatched=false");
    assert_eq!(
        rows.lock().unwrap().len(),
        1,
        "the row is recorded even when dispatch fails"
    );
}

#[tokio::test]
async fn should_degrade_to_timestamp_id_without_transaction_id() {
    let uc = purchase_usecase(
        MockDedupRepo::empty(),
        MockConversions::ok(),
        MockAttributionStore::empty(),
    );

    let outcome = uc.execute(purchase_input(None)).await.unwrap();

    let suffix = outcome.event_id.strip_prefix("pur:").unwrap();
    assert!(
        suffix.parse::<i64>().unwrap() > 0,
        "degraded id should be a unix-millis timestamp, got {suffix}"
    );
    assert!(!outcome.deduplicated);
}

#[tokio::test]
async fn should_treat_blank_transaction_id_as_missing() {
    let uc = purchase_usecase(
        MockDedupRepo::empty(),
        MockConversions::ok(),
        MockAttributionStore::empty(),
    );

    let outcome = uc.execute(purchase_input(Some("   "))).await.unwrap();

    let suffix = outcome.event_id.strip_prefix("pur:").unwrap();
    assert!(suffix.parse::<i64>().is_ok());
}

#[tokio::test]
async fn should_fill_browser_ids_from_attribution_touch() {
    let attribution = MockAttributionStore::empty();
    attribution
        .touches
        .lock()
        .unwrap()
        .insert(
            "visitor-7".to_owned(),
            touch_with(Some("fb.1.100.AAA"), Some("fb.1.100.click")),
        );
    let conversions = MockConversions::ok();
    let sent = conversions.sent_handle();

    let uc = purchase_usecase(MockDedupRepo::empty(), conversions, attribution);
    let mut input = purchase_input(Some("TX-1003"));
    input.visitor_id = Some("visitor-7".to_owned());
    uc.execute(input).await.unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent[0].fbp.as_deref(), Some("fb.1.100.AAA"));
    assert_eq!(sent[0].fbc.as_deref(), Some("fb.1.100.click"));
}

#[tokio::test]
async fn should_prefer_explicit_browser_ids_over_touch() {
    let attribution = MockAttributionStore::empty();
    attribution.touches.lock().unwrap().insert(
        "visitor-7".to_owned(),
        touch_with(Some("fb.1.100.OLD"), None),
    );
    let conversions = MockConversions::ok();
    let sent = conversions.sent_handle();

    let uc = purchase_usecase(MockDedupRepo::empty(), conversions, attribution);
    let mut input = purchase_input(Some("TX-1004"));
    input.visitor_id = Some("visitor-7".to_owned());
    input.fbp = Some("fb.1.200.NEW".to_owned());
    uc.execute(input).await.unwrap();

    assert_eq!(
        sent.lock().unwrap()[0].fbp.as_deref(),
        Some("fb.1.200.NEW")
    );
}

#[tokio::test]
async fn should_record_purchase_when_attribution_store_is_down() {
    let uc = purchase_usecase(
        MockDedupRepo::empty(),
        MockConversions::ok(),
        MockAttributionStore::failing(),
    );
    let mut input = purchase_input(Some("TX-1005"));
    input.visitor_id = Some("visitor-7".to_owned());

    let outcome = uc.execute(input).await.unwrap();

    assert!(outcome.dispatched, "attribution is best effort");
}

#[tokio::test]
async fn should_reuse_event_id_after_expiry() {
    let mut leftover = dedup_record("pur:TX-1006", "TX-1006");
    leftover.created_at = Utc::now() - Duration::hours(48);
    leftover.expires_at = Utc::now() - Duration::hours(24);
    let dedup = MockDedupRepo::with_rows(vec![leftover]);
    let rows = dedup.rows_handle();

    let uc = purchase_usecase(dedup, MockConversions::ok(), MockAttributionStore::empty());
    let outcome = uc.execute(purchase_input(Some("TX-1006"))).await.unwrap();

    assert!(!outcome.deduplicated, "expired row no longer counts as seen");
    assert!(outcome.dispatched);

    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].expires_at > Utc::now());
}

#[tokio::test]
async fn should_purge_expired_rows_on_cadence() {
    let mut stale = dedup_record("pur:TX-OLD", "TX-OLD");
    stale.created_at = Utc::now() - Duration::hours(72);
    stale.expires_at = Utc::now() - Duration::hours(48);
    let dedup = MockDedupRepo::with_rows(vec![stale]);
    let rows = dedup.rows_handle();

    // Cadence 1: the purge runs right after the first successful insert.
    let uc = purchase_usecase(dedup, MockConversions::ok(), MockAttributionStore::empty());
    uc.execute(purchase_input(Some("TX-1007"))).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 1, "the stale row should have been purged");
    assert_eq!(rows[0].event_id, "pur:TX-1007");
}

#[tokio::test]
async fn should_not_purge_before_cadence_is_reached() {
    let mut stale = dedup_record("pur:TX-OLD", "TX-OLD");
    stale.created_at = Utc::now() - Duration::hours(72);
    stale.expires_at = Utc::now() - Duration::hours(48);
    let dedup = MockDedupRepo::with_rows(vec![stale]);
    let rows = dedup.rows_handle();

    let uc = RecordPurchaseUseCase {
        dedup,
        conversions: MockConversions::ok(),
        attribution: MockAttributionStore::empty(),
        cadence: PurgeCadence::new(10),
        dedup_ttl_hours: 24,
    };
    uc.execute(purchase_input(Some("TX-1008"))).await.unwrap();

    assert_eq!(
        rows.lock().unwrap().len(),
        2,
        "one insert out of ten should not trigger the purge"
    );
}

#[tokio::test]
async fn should_keep_caller_supplied_event_time() {
    let conversions = MockConversions::ok();
    let sent = conversions.sent_handle();

    let uc = purchase_usecase(MockDedupRepo::empty(), conversions, MockAttributionStore::empty());
    let input = PurchaseInput {
        event_time: Some(1_690_000_000),
        ..purchase_input(Some("TX-1009"))
    };
    uc.execute(input).await.unwrap();

    assert_eq!(sent.lock().unwrap()[0].event_time, 1_690_000_000);
}
