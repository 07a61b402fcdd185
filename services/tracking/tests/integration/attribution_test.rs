use rastro_domain::normalize::RawUserData;
use rastro_tracking::error::TrackingServiceError;
use rastro_tracking::usecase::attribution::{
    ResolveTouchUseCase, SaveTouchInput, SaveTouchUseCase,
};

use crate::helpers::{MockAttributionStore, touch_with};

fn touch_input(url: Option<&str>) -> SaveTouchInput {
    SaveTouchInput {
        fbp: Some("fb.1.1700000000.42".to_owned()),
        fbc: None,
        url: url.map(str::to_owned),
        user: RawUserData::default(),
    }
}

#[tokio::test]
async fn should_capture_utm_parameters_from_the_landing_url() {
    let store = MockAttributionStore::empty();
    let touches = store.touches_handle();

    let uc = SaveTouchUseCase { store };
    uc.execute(
        "visitor-1",
        touch_input(Some(
            "https://lp.example.com/oferta?utm_source=telegram&utm_medium=bot&utm_campaign=promo-julho",
        )),
    )
    .await
    .unwrap();

    let touches = touches.lock().unwrap();
    let touch = touches.get("visitor-1").unwrap();
    assert_eq!(touch.utm.source.as_deref(), Some("telegram"));
    assert_eq!(touch.utm.medium.as_deref(), Some("bot"));
    assert_eq!(touch.utm.campaign.as_deref(), Some("promo-julho"));
    assert_eq!(touch.fbp.as_deref(), Some("fb.1.1700000000.42"));
}

#[tokio::test]
async fn should_normalize_user_data_before_storing() {
    let store = MockAttributionStore::empty();
    let touches = store.touches_handle();

    let uc = SaveTouchUseCase { store };
    uc.execute(
        "visitor-2",
        SaveTouchInput {
            user: RawUserData {
                email: Some("  Maria@Example.COM ".to_owned()),
                phone: Some("(11) 91234-5678".to_owned()),
                ..RawUserData::default()
            },
            ..touch_input(None)
        },
    )
    .await
    .unwrap();

    let touches = touches.lock().unwrap();
    let touch = touches.get("visitor-2").unwrap();
    assert_eq!(touch.user.email.as_deref(), Some("maria@example.com"));
    assert_eq!(touch.user.phone.as_deref(), Some("11912345678"));
}

#[tokio::test]
async fn should_merge_new_touch_over_the_stored_one() {
    let store = MockAttributionStore::empty();
    let touches = store.touches_handle();
    touches.lock().unwrap().insert(
        "visitor-3".to_owned(),
        touch_with(Some("fb.1.100.OLD"), Some("fb.1.100.click")),
    );

    let uc = SaveTouchUseCase { store };
    uc.execute(
        "visitor-3",
        SaveTouchInput {
            fbp: Some("fb.1.200.NEW".to_owned()),
            fbc: None,
            url: None,
            user: RawUserData::default(),
        },
    )
    .await
    .unwrap();

    let touches = touches.lock().unwrap();
    let touch = touches.get("visitor-3").unwrap();
    assert_eq!(touch.fbp.as_deref(), Some("fb.1.200.NEW"), "newer value wins");
    assert_eq!(
        touch.fbc.as_deref(),
        Some("fb.1.100.click"),
        "gaps keep the stored value"
    );
}

#[tokio::test]
async fn should_resolve_a_stored_touch() {
    let store = MockAttributionStore::empty();
    store
        .touches
        .lock()
        .unwrap()
        .insert("visitor-4".to_owned(), touch_with(Some("fb.1.1.A"), None));

    let uc = ResolveTouchUseCase { store };
    let touch = uc.execute("visitor-4").await.unwrap();

    assert_eq!(touch.fbp.as_deref(), Some("fb.1.1.A"));
}

#[tokio::test]
async fn should_return_not_found_for_an_unknown_visitor() {
    let uc = ResolveTouchUseCase {
        store: MockAttributionStore::empty(),
    };

    let result = uc.execute("visitor-unknown").await;

    assert!(
        matches!(result, Err(TrackingServiceError::TouchNotFound)),
        "expected TouchNotFound, got {result:?}"
    );
}
