use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use rastro_domain::normalize::RawUserData;
use rastro_domain::pagination::PageRequest;

use crate::domain::types::{DedupRecord, EventSource};
use crate::error::TrackingServiceError;
use crate::state::AppState;
use crate::usecase::audit::{GetEventUseCase, ListTransactionEventsUseCase};
use crate::usecase::record::{
    NamedEventInput, PurchaseInput, RecordNamedEventUseCase, RecordOutcome, RecordPurchaseUseCase,
};

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PurchaseEventRequest {
    pub transaction_id: Option<String>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    /// Unix seconds; retries should resend the original time.
    pub event_time: Option<i64>,
    pub event_source_url: Option<String>,
    pub visitor_id: Option<String>,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub user: RawUserData,
}

#[derive(Deserialize)]
pub struct NamedEventRequest {
    pub event_name: String,
    /// Identity folded into the deterministic event id.
    pub user_id: Option<String>,
    /// Milliseconds folded into the deterministic event id.
    pub timestamp_ms: Option<i64>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub event_time: Option<i64>,
    pub event_source_url: Option<String>,
    pub visitor_id: Option<String>,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub user: RawUserData,
}

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TrackResponse {
    pub event_id: String,
    pub deduplicated: bool,
    pub dispatched: bool,
}

impl From<RecordOutcome> for TrackResponse {
    fn from(outcome: RecordOutcome) -> Self {
        Self {
            event_id: outcome.event_id,
            deduplicated: outcome.deduplicated,
            dispatched: outcome.dispatched,
        }
    }
}

#[derive(Serialize)]
pub struct AuditEventResponse {
    pub event_id: String,
    pub transaction_id: String,
    pub event_name: String,
    pub value: Option<f64>,
    pub currency: String,
    pub source: EventSource,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub external_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(serialize_with = "rastro_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "rastro_core::serde::to_rfc3339_ms")]
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl From<DedupRecord> for AuditEventResponse {
    fn from(record: DedupRecord) -> Self {
        Self {
            event_id: record.event_id,
            transaction_id: record.transaction_id,
            event_name: record.event_name,
            value: record.value,
            currency: record.currency,
            source: record.source,
            fbp: record.fbp,
            fbc: record.fbc,
            external_id: record.external_id,
            ip_address: record.ip_address,
            user_agent: record.user_agent,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /events/purchase — server-side purchase report (the bot flow).
///
/// 201 when the event was fresh, 200 when the ledger already had it.
pub async fn create_purchase_event(
    State(state): State<AppState>,
    Json(body): Json<PurchaseEventRequest>,
) -> Result<(StatusCode, Json<TrackResponse>), TrackingServiceError> {
    let uc = RecordPurchaseUseCase {
        dedup: state.dedup_repo(),
        conversions: state.conversions(),
        attribution: state.attribution_store(),
        cadence: state.purge_cadence(),
        dedup_ttl_hours: state.dedup_ttl_hours,
    };

    let outcome = uc
        .execute(PurchaseInput {
            transaction_id: body.transaction_id,
            value: body.value,
            currency: body.currency,
            source: EventSource::Capi,
            visitor_id: body.visitor_id,
            event_source_url: body.event_source_url,
            user: body.user,
            fbp: body.fbp,
            fbc: body.fbc,
            ip_address: body.ip_address,
            user_agent: body.user_agent,
            event_time: body.event_time,
        })
        .await?;

    let status = if outcome.deduplicated {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome.into())))
}

/// POST /events — server-side generic named event.
pub async fn create_named_event(
    State(state): State<AppState>,
    Json(body): Json<NamedEventRequest>,
) -> Result<(StatusCode, Json<TrackResponse>), TrackingServiceError> {
    let uc = RecordNamedEventUseCase {
        dedup: state.dedup_repo(),
        conversions: state.conversions(),
        attribution: state.attribution_store(),
        cadence: state.purge_cadence(),
        dedup_ttl_hours: state.dedup_ttl_hours,
    };

    let outcome = uc
        .execute(NamedEventInput {
            event_name: body.event_name,
            user_id: body.user_id,
            timestamp_ms: body.timestamp_ms,
            value: body.value,
            currency: body.currency,
            source: EventSource::Capi,
            visitor_id: body.visitor_id,
            event_source_url: body.event_source_url,
            user: body.user,
            fbp: body.fbp,
            fbc: body.fbc,
            ip_address: body.ip_address,
            user_agent: body.user_agent,
            event_time: body.event_time,
        })
        .await?;

    let status = if outcome.deduplicated {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome.into())))
}

/// GET /events/{event_id} — audit fetch of one ledger row.
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<AuditEventResponse>, TrackingServiceError> {
    let uc = GetEventUseCase {
        dedup: state.dedup_repo(),
    };

    let record = uc.execute(&event_id).await?;
    Ok(Json(record.into()))
}

/// GET /transactions/{transaction_id}/events — audit list, newest first.
pub async fn list_transaction_events(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<AuditEventResponse>>, TrackingServiceError> {
    let uc = ListTransactionEventsUseCase {
        dedup: state.dedup_repo(),
    };

    let records = uc.execute(&transaction_id, page).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
