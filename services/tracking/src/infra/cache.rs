use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;

use crate::domain::repository::AttributionStore;
use crate::domain::types::AttributionTouch;
use crate::error::TrackingServiceError;

/// Redis-backed attribution touch store. Touches are JSON values under
/// `attribution:<visitor_id>` with a fixed TTL; every save rewrites the value
/// and resets the clock.
#[derive(Clone)]
pub struct RedisAttributionStore {
    pub pool: Pool,
    pub ttl_secs: u64,
}

fn touch_key(visitor_id: &str) -> String {
    format!("attribution:{visitor_id}")
}

impl AttributionStore for RedisAttributionStore {
    async fn save_touch(
        &self,
        visitor_id: &str,
        touch: &AttributionTouch,
    ) -> Result<(), TrackingServiceError> {
        let payload = serde_json::to_string(touch)
            .map_err(|e| TrackingServiceError::Internal(e.into()))?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| TrackingServiceError::Internal(e.into()))?;

        let (): () = conn
            .set_ex(touch_key(visitor_id), payload, self.ttl_secs)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| {
                TrackingServiceError::Internal(e.into())
            })?;
        Ok(())
    }

    async fn load_touch(
        &self,
        visitor_id: &str,
    ) -> Result<Option<AttributionTouch>, TrackingServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| TrackingServiceError::Internal(e.into()))?;

        let payload: Option<String> = conn
            .get(touch_key(visitor_id))
            .await
            .map_err(|e| TrackingServiceError::Internal(e.into()))?;

        payload
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| TrackingServiceError::Internal(e.into()))
    }
}
