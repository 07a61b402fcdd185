use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use rastro_domain::event_id::{named_event_id, purchase_event_id};
use rastro_domain::normalize::{NormalizedUserData, RawUserData, normalize_source_url};

use crate::domain::repository::{AttributionStore, ConversionsPort, DedupRepository};
use crate::domain::types::{ConversionEvent, DedupRecord, EventSource, PurgeCadence};
use crate::error::TrackingServiceError;

/// Currency assumed when an event does not state one.
const DEFAULT_CURRENCY: &str = "BRL";

// ── Purchase ─────────────────────────────────────────────────────────────────

pub struct PurchaseInput {
    pub transaction_id: Option<String>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub source: EventSource,
    pub visitor_id: Option<String>,
    pub event_source_url: Option<String>,
    pub user: RawUserData,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Unix seconds, defaults to now. Retries must carry the original time so
    /// the forwarded event keeps its place on the timeline.
    pub event_time: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub event_id: String,
    /// The ledger already held this event id; nothing was forwarded.
    pub deduplicated: bool,
    /// The event reached the Conversions API.
    pub dispatched: bool,
}

pub struct RecordPurchaseUseCase<D: DedupRepository, C: ConversionsPort, A: AttributionStore> {
    pub dedup: D,
    pub conversions: C,
    pub attribution: A,
    pub cadence: PurgeCadence,
    pub dedup_ttl_hours: i64,
}

impl<D: DedupRepository, C: ConversionsPort, A: AttributionStore>
    RecordPurchaseUseCase<D, C, A>
{
    pub async fn execute(
        &self,
        input: PurchaseInput,
    ) -> Result<RecordOutcome, TrackingServiceError> {
        let transaction_id = input
            .transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);
        let event_id = purchase_event_id(transaction_id.as_deref());
        if transaction_id.is_none() {
            warn!(
                %event_id,
                "purchase without a transaction id, event id degrades to a timestamp"
            );
        }

        let (fbp, fbc) = resolve_correlation(
            &self.attribution,
            input.visitor_id.as_deref(),
            input.fbp,
            input.fbc,
        )
        .await;

        let user = NormalizedUserData::from_raw(&input.user);
        let currency = input
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned());
        let now = Utc::now();

        let record = DedupRecord {
            event_id: event_id.clone(),
            transaction_id: transaction_id.unwrap_or_default(),
            event_name: "Purchase".to_owned(),
            value: input.value,
            currency: currency.clone(),
            source: input.source,
            fbp: fbp.clone(),
            fbc: fbc.clone(),
            external_id: user.external_id.clone(),
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            created_at: now,
            expires_at: now + Duration::hours(self.dedup_ttl_hours),
        };
        let event = ConversionEvent {
            event_name: "Purchase".to_owned(),
            event_time: input.event_time.unwrap_or_else(|| now.timestamp()),
            event_id: event_id.clone(),
            source: input.source,
            event_source_url: input
                .event_source_url
                .as_deref()
                .and_then(normalize_source_url),
            user,
            fbp,
            fbc,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            value: input.value,
            currency,
        };

        let (deduplicated, dispatched) =
            persist_and_forward(&self.dedup, &self.conversions, &self.cadence, record, event)
                .await?;
        Ok(RecordOutcome {
            event_id,
            deduplicated,
            dispatched,
        })
    }
}

// ── Named events ─────────────────────────────────────────────────────────────

pub struct NamedEventInput {
    pub event_name: String,
    /// Identity the deterministic id is derived from; usually the visitor id.
    pub user_id: Option<String>,
    /// Milliseconds fed into the id hash; defaults to now.
    pub timestamp_ms: Option<i64>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub source: EventSource,
    pub visitor_id: Option<String>,
    pub event_source_url: Option<String>,
    pub user: RawUserData,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub event_time: Option<i64>,
}

pub struct RecordNamedEventUseCase<D: DedupRepository, C: ConversionsPort, A: AttributionStore> {
    pub dedup: D,
    pub conversions: C,
    pub attribution: A,
    pub cadence: PurgeCadence,
    pub dedup_ttl_hours: i64,
}

impl<D: DedupRepository, C: ConversionsPort, A: AttributionStore>
    RecordNamedEventUseCase<D, C, A>
{
    pub async fn execute(
        &self,
        input: NamedEventInput,
    ) -> Result<RecordOutcome, TrackingServiceError> {
        let event_name = input.event_name.trim().to_owned();
        if event_name.is_empty() {
            return Err(TrackingServiceError::InvalidEvent(
                "event_name must not be empty",
            ));
        }

        let event_id = named_event_id(&event_name, input.user_id.as_deref(), input.timestamp_ms);

        let (fbp, fbc) = resolve_correlation(
            &self.attribution,
            input.visitor_id.as_deref(),
            input.fbp,
            input.fbc,
        )
        .await;

        let user = NormalizedUserData::from_raw(&input.user);
        let currency = input
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned());
        let now = Utc::now();

        let record = DedupRecord {
            event_id: event_id.clone(),
            transaction_id: String::new(),
            event_name: event_name.clone(),
            value: input.value,
            currency: currency.clone(),
            source: input.source,
            fbp: fbp.clone(),
            fbc: fbc.clone(),
            external_id: user.external_id.clone(),
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            created_at: now,
            expires_at: now + Duration::hours(self.dedup_ttl_hours),
        };
        let event = ConversionEvent {
            event_name,
            event_time: input.event_time.unwrap_or_else(|| now.timestamp()),
            event_id: event_id.clone(),
            source: input.source,
            event_source_url: input
                .event_source_url
                .as_deref()
                .and_then(normalize_source_url),
            user,
            fbp,
            fbc,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            value: input.value,
            currency,
        };

        let (deduplicated, dispatched) =
            persist_and_forward(&self.dedup, &self.conversions, &self.cadence, record, event)
                .await?;
        Ok(RecordOutcome {
            event_id,
            deduplicated,
            dispatched,
        })
    }
}

// ── Shared pipeline ──────────────────────────────────────────────────────────

/// Insert-then-forward, the core dedup contract: dispatch happens only for a
/// freshly inserted row, so one event id reaches the Conversions API at most
/// once per TTL window. Returns `(deduplicated, dispatched)`.
async fn persist_and_forward<D: DedupRepository, C: ConversionsPort>(
    dedup: &D,
    conversions: &C,
    cadence: &PurgeCadence,
    record: DedupRecord,
    event: ConversionEvent,
) -> Result<(bool, bool), TrackingServiceError> {
    let inserted = dedup.insert_if_absent(&record).await?;
    if !inserted {
        debug!(
            event_id = %record.event_id,
            source = record.source.as_str(),
            "event already recorded, dispatch suppressed"
        );
        return Ok((true, false));
    }

    let dispatched = match conversions.send(&event).await {
        Ok(()) => true,
        Err(error) => {
            warn!(%error, event_id = %record.event_id, "conversions dispatch failed");
            false
        }
    };

    if cadence.due() {
        match dedup.purge_expired(Utc::now()).await {
            Ok(purged) if purged > 0 => info!(purged, "purged expired dedup rows"),
            Ok(_) => {}
            Err(error) => warn!(%error, "dedup purge failed"),
        }
    }

    Ok((false, dispatched))
}

/// Fills missing browser correlation ids from the visitor's stored attribution
/// touch. Store failures are logged and ignored; attribution is best effort
/// and must never block a conversion.
async fn resolve_correlation<A: AttributionStore>(
    store: &A,
    visitor_id: Option<&str>,
    fbp: Option<String>,
    fbc: Option<String>,
) -> (Option<String>, Option<String>) {
    if fbp.is_some() && fbc.is_some() {
        return (fbp, fbc);
    }
    let Some(visitor_id) = visitor_id else {
        return (fbp, fbc);
    };
    match store.load_touch(visitor_id).await {
        Ok(Some(touch)) => (fbp.or(touch.fbp), fbc.or(touch.fbc)),
        Ok(None) => (fbp, fbc),
        Err(error) => {
            warn!(%error, visitor_id, "attribution lookup failed, continuing without it");
            (fbp, fbc)
        }
    }
}
