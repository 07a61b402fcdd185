use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::dispatch::{SanitizedSink, TrackingPixelSink};
use crate::domain::types::PurgeCadence;
use crate::infra::cache::RedisAttributionStore;
use crate::infra::capi::HttpConversionsClient;
use crate::infra::db::DbDedupRepository;

/// The production sink chain: sanitizer over the DB/Redis/CAPI pipeline.
pub type AppPixelSink =
    SanitizedSink<TrackingPixelSink<DbDedupRepository, HttpConversionsClient, RedisAttributionStore>>;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: deadpool_redis::Pool,
    pub capi: HttpConversionsClient,
    /// Built once in `main`; the sanitizer's enricher list never changes after
    /// startup.
    pub sink: Arc<AppPixelSink>,
    pub cadence: PurgeCadence,
    pub dedup_ttl_hours: i64,
    pub attribution_ttl_secs: u64,
}

impl AppState {
    pub fn dedup_repo(&self) -> DbDedupRepository {
        DbDedupRepository {
            db: self.db.clone(),
        }
    }

    pub fn attribution_store(&self) -> RedisAttributionStore {
        RedisAttributionStore {
            pool: self.redis.clone(),
            ttl_secs: self.attribution_ttl_secs,
        }
    }

    pub fn conversions(&self) -> HttpConversionsClient {
        self.capi.clone()
    }

    pub fn purge_cadence(&self) -> PurgeCadence {
        self.cadence.clone()
    }

    pub fn pixel_sink(&self) -> Arc<AppPixelSink> {
        Arc::clone(&self.sink)
    }
}
