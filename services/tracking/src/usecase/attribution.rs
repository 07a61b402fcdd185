use chrono::Utc;

use rastro_domain::attribution::UtmParams;
use rastro_domain::normalize::{NormalizedUserData, RawUserData};

use crate::domain::repository::AttributionStore;
use crate::domain::types::AttributionTouch;
use crate::error::TrackingServiceError;

pub struct SaveTouchInput {
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    /// Landing-page URL; UTM parameters are read from its query string.
    pub url: Option<String>,
    pub user: RawUserData,
}

/// Store a landing-page touch for a visitor, merged over whatever is already
/// there. Saving resets the TTL, so an active visitor keeps their attribution
/// alive.
pub struct SaveTouchUseCase<A: AttributionStore> {
    pub store: A,
}

impl<A: AttributionStore> SaveTouchUseCase<A> {
    pub async fn execute(
        &self,
        visitor_id: &str,
        input: SaveTouchInput,
    ) -> Result<(), TrackingServiceError> {
        let utm = input
            .url
            .as_deref()
            .map(UtmParams::from_url)
            .unwrap_or_default();
        let touch = AttributionTouch {
            fbp: input.fbp,
            fbc: input.fbc,
            utm,
            user: NormalizedUserData::from_raw(&input.user),
            captured_at: Utc::now(),
        };

        let merged = match self.store.load_touch(visitor_id).await? {
            Some(previous) => previous.merged_with(touch),
            None => touch,
        };
        self.store.save_touch(visitor_id, &merged).await
    }
}

/// Resolve a visitor's stored touch; the bot flow reads this before reporting
/// a server-side purchase.
pub struct ResolveTouchUseCase<A: AttributionStore> {
    pub store: A,
}

impl<A: AttributionStore> ResolveTouchUseCase<A> {
    pub async fn execute(
        &self,
        visitor_id: &str,
    ) -> Result<AttributionTouch, TrackingServiceError> {
        self.store
            .load_touch(visitor_id)
            .await?
            .ok_or(TrackingServiceError::TouchNotFound)
    }
}
