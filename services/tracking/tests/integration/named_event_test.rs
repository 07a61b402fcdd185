use rastro_tracking::error::TrackingServiceError;
use rastro_tracking::usecase::record::NamedEventInput;

use crate::helpers::{
    MockAttributionStore, MockConversions, MockDedupRepo, named_input, named_usecase,
};

#[tokio::test]
async fn should_derive_the_same_id_for_identical_inputs() {
    let dedup = MockDedupRepo::empty();
    let conversions = MockConversions::ok();
    let sent = conversions.sent_handle();

    let uc = named_usecase(dedup, conversions, MockAttributionStore::empty());
    let first = uc.execute(named_input("ViewContent")).await.unwrap();
    let second = uc.execute(named_input("ViewContent")).await.unwrap();

    assert_eq!(first.event_id, second.event_id);
    assert!(first.event_id.starts_with('e'));
    assert!(!first.deduplicated);
    assert!(second.deduplicated, "identical replay should deduplicate");
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_vary_the_id_with_the_event_name() {
    let uc = named_usecase(
        MockDedupRepo::empty(),
        MockConversions::ok(),
        MockAttributionStore::empty(),
    );

    let view = uc.execute(named_input("ViewContent")).await.unwrap();
    let cart = uc.execute(named_input("AddToCart")).await.unwrap();

    assert_ne!(view.event_id, cart.event_id);
}

#[tokio::test]
async fn should_reject_blank_event_name() {
    let uc = named_usecase(
        MockDedupRepo::empty(),
        MockConversions::ok(),
        MockAttributionStore::empty(),
    );

    let result = uc.execute(named_input("   ")).await;

    assert!(
        matches!(result, Err(TrackingServiceError::InvalidEvent(_))),
        "expected InvalidEvent, got {result:?}"
    );
}

#[tokio::test]
async fn should_store_named_events_without_a_transaction() {
    let dedup = MockDedupRepo::empty();
    let rows = dedup.rows_handle();

    let uc = named_usecase(dedup, MockConversions::ok(), MockAttributionStore::empty());
    uc.execute(named_input("Lead")).await.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].event_name, "Lead");
    assert_eq!(rows[0].transaction_id, "");
}

#[tokio::test]
async fn should_trim_the_event_name_before_hashing() {
    let uc = named_usecase(
        MockDedupRepo::empty(),
        MockConversions::ok(),
        MockAttributionStore::empty(),
    );

    let padded = uc
        .execute(NamedEventInput {
            event_name: "  Lead  ".to_owned(),
            ..named_input("Lead")
        })
        .await
        .unwrap();
    let plain = uc.execute(named_input("Lead")).await.unwrap();

    assert_eq!(padded.event_id, plain.event_id);
    assert!(
        plain.deduplicated,
        "the trimmed name should collide with the plain one"
    );
}

#[tokio::test]
async fn should_forward_value_and_currency() {
    let conversions = MockConversions::ok();
    let sent = conversions.sent_handle();

    let uc = named_usecase(
        MockDedupRepo::empty(),
        conversions,
        MockAttributionStore::empty(),
    );
    uc.execute(NamedEventInput {
        value: Some(49.9),
        currency: Some("USD".to_owned()),
        ..named_input("AddToCart")
    })
    .await
    .unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent[0].value, Some(49.9));
    assert_eq!(sent[0].currency, "USD");
}
