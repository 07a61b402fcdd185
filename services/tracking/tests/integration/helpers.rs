use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use rastro_domain::normalize::RawUserData;
use rastro_domain::pagination::PageRequest;
use rastro_tracking::domain::repository::{AttributionStore, ConversionsPort, DedupRepository};
use rastro_tracking::domain::types::{
    AttributionTouch, ConversionEvent, DedupRecord, EventSource, PurgeCadence,
};
use rastro_tracking::error::TrackingServiceError;
use rastro_tracking::usecase::record::{
    NamedEventInput, PurchaseInput, RecordNamedEventUseCase, RecordPurchaseUseCase,
};

// ── MockDedupRepo ────────────────────────────────────────────────────────────

/// In-memory dedup ledger with the same collision and expiry semantics as the
/// Postgres implementation.
#[derive(Clone, Default)]
pub struct MockDedupRepo {
    pub rows: Arc<Mutex<Vec<DedupRecord>>>,
}

impl MockDedupRepo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<DedupRecord>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    /// Shared handle to the row list for post-execution inspection.
    pub fn rows_handle(&self) -> Arc<Mutex<Vec<DedupRecord>>> {
        Arc::clone(&self.rows)
    }
}

impl DedupRepository for MockDedupRepo {
    async fn insert_if_absent(&self, record: &DedupRecord) -> Result<bool, TrackingServiceError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|r| !(r.event_id == record.event_id && r.expires_at <= record.created_at));
        if rows.iter().any(|r| r.event_id == record.event_id) {
            return Ok(false);
        }
        rows.push(record.clone());
        Ok(true)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, TrackingServiceError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.expires_at > now);
        Ok((before - rows.len()) as u64)
    }

    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<DedupRecord>, TrackingServiceError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.event_id == event_id)
            .cloned())
    }

    async fn list_by_transaction(
        &self,
        transaction_id: &str,
        page: PageRequest,
    ) -> Result<Vec<DedupRecord>, TrackingServiceError> {
        let mut rows: Vec<DedupRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.transaction_id == transaction_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect())
    }
}

// ── MockConversions ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockConversions {
    pub sent: Arc<Mutex<Vec<ConversionEvent>>>,
    pub fail: bool,
}

impl MockConversions {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Shared handle to the dispatched events for post-execution inspection.
    pub fn sent_handle(&self) -> Arc<Mutex<Vec<ConversionEvent>>> {
        Arc::clone(&self.sent)
    }
}

impl ConversionsPort for MockConversions {
    async fn send(&self, event: &ConversionEvent) -> Result<(), TrackingServiceError> {
        if self.fail {
            return Err(TrackingServiceError::Internal(anyhow::anyhow!(
                "conversions api unavailable"
            )));
        }
        self.sent.lock().unwrap().push(event.clone());
        Ok(())
    }
}

// ── MockAttributionStore ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockAttributionStore {
    pub touches: Arc<Mutex<HashMap<String, AttributionTouch>>>,
    pub fail: bool,
}

impl MockAttributionStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn touches_handle(&self) -> Arc<Mutex<HashMap<String, AttributionTouch>>> {
        Arc::clone(&self.touches)
    }
}

impl AttributionStore for MockAttributionStore {
    async fn save_touch(
        &self,
        visitor_id: &str,
        touch: &AttributionTouch,
    ) -> Result<(), TrackingServiceError> {
        if self.fail {
            return Err(TrackingServiceError::Internal(anyhow::anyhow!(
                "redis unavailable"
            )));
        }
        self.touches
            .lock()
            .unwrap()
            .insert(visitor_id.to_owned(), touch.clone());
        Ok(())
    }

    async fn load_touch(
        &self,
        visitor_id: &str,
    ) -> Result<Option<AttributionTouch>, TrackingServiceError> {
        if self.fail {
            return Err(TrackingServiceError::Internal(anyhow::anyhow!(
                "redis unavailable"
            )));
        }
        Ok(self.touches.lock().unwrap().get(visitor_id).cloned())
    }
}

// ── Builders ─────────────────────────────────────────────────────────────────

pub fn purchase_usecase(
    dedup: MockDedupRepo,
    conversions: MockConversions,
    attribution: MockAttributionStore,
) -> RecordPurchaseUseCase<MockDedupRepo, MockConversions, MockAttributionStore> {
    RecordPurchaseUseCase {
        dedup,
        conversions,
        attribution,
        cadence: PurgeCadence::new(1),
        dedup_ttl_hours: 24,
    }
}

pub fn named_usecase(
    dedup: MockDedupRepo,
    conversions: MockConversions,
    attribution: MockAttributionStore,
) -> RecordNamedEventUseCase<MockDedupRepo, MockConversions, MockAttributionStore> {
    RecordNamedEventUseCase {
        dedup,
        conversions,
        attribution,
        cadence: PurgeCadence::new(1),
        dedup_ttl_hours: 24,
    }
}

pub fn purchase_input(transaction_id: Option<&str>) -> PurchaseInput {
    PurchaseInput {
        transaction_id: transaction_id.map(str::to_owned),
        value: Some(297.0),
        currency: None,
        source: EventSource::Capi,
        visitor_id: None,
        event_source_url: None,
        user: RawUserData::default(),
        fbp: None,
        fbc: None,
        ip_address: None,
        user_agent: None,
        event_time: None,
    }
}

pub fn named_input(event_name: &str) -> NamedEventInput {
    NamedEventInput {
        event_name: event_name.to_owned(),
        user_id: Some("visitor-1".to_owned()),
        timestamp_ms: Some(1_700_000_000_000),
        value: None,
        currency: None,
        source: EventSource::Capi,
        visitor_id: Some("visitor-1".to_owned()),
        event_source_url: None,
        user: RawUserData::default(),
        fbp: None,
        fbc: None,
        ip_address: None,
        user_agent: None,
        event_time: None,
    }
}

pub fn dedup_record(event_id: &str, transaction_id: &str) -> DedupRecord {
    let now = Utc::now();
    DedupRecord {
        event_id: event_id.to_owned(),
        transaction_id: transaction_id.to_owned(),
        event_name: "Purchase".to_owned(),
        value: Some(297.0),
        currency: "BRL".to_owned(),
        source: EventSource::Capi,
        fbp: None,
        fbc: None,
        external_id: None,
        ip_address: None,
        user_agent: None,
        created_at: now,
        expires_at: now + Duration::hours(24),
    }
}

pub fn touch_with(fbp: Option<&str>, fbc: Option<&str>) -> AttributionTouch {
    AttributionTouch {
        fbp: fbp.map(str::to_owned),
        fbc: fbc.map(str::to_owned),
        utm: Default::default(),
        user: Default::default(),
        captured_at: Utc::now(),
    }
}
