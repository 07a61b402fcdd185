#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use rastro_domain::pagination::PageRequest;

use crate::domain::types::{AttributionTouch, ConversionEvent, DedupRecord};
use crate::error::TrackingServiceError;

/// Port over the `purchase_event_dedup` ledger.
pub trait DedupRepository: Send + Sync {
    /// Inserts a record unless its event id is already present. Returns `true`
    /// iff the row was newly inserted. An expired leftover with the same id is
    /// cleared first, so an id becomes reusable once its TTL has passed.
    async fn insert_if_absent(&self, record: &DedupRecord) -> Result<bool, TrackingServiceError>;

    /// Deletes rows past their expiry; returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, TrackingServiceError>;

    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<DedupRecord>, TrackingServiceError>;

    /// Audit listing for one transaction, newest first.
    async fn list_by_transaction(
        &self,
        transaction_id: &str,
        page: PageRequest,
    ) -> Result<Vec<DedupRecord>, TrackingServiceError>;
}

/// Port over the per-visitor attribution touch store.
pub trait AttributionStore: Send + Sync {
    async fn save_touch(
        &self,
        visitor_id: &str,
        touch: &AttributionTouch,
    ) -> Result<(), TrackingServiceError>;

    async fn load_touch(
        &self,
        visitor_id: &str,
    ) -> Result<Option<AttributionTouch>, TrackingServiceError>;
}

/// Outbound port to the ad platform's Conversions API.
pub trait ConversionsPort: Send + Sync {
    async fn send(&self, event: &ConversionEvent) -> Result<(), TrackingServiceError>;
}
