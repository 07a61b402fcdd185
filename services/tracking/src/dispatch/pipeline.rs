use serde_json::Value;
use tracing::debug;

use rastro_domain::event_id::PURCHASE_ID_PREFIX;
use rastro_domain::normalize::RawUserData;

use crate::dispatch::{CallContext, PixelCall, PixelSink};
use crate::domain::repository::{AttributionStore, ConversionsPort, DedupRepository};
use crate::domain::types::{EventSource, PurgeCadence};
use crate::error::TrackingServiceError;
use crate::usecase::attribution::{SaveTouchInput, SaveTouchUseCase};
use crate::usecase::record::{
    NamedEventInput, PurchaseInput, RecordNamedEventUseCase, RecordPurchaseUseCase,
};

/// Production sink: routes sanitized pixel calls onto the tracking pipeline.
///
/// `track`/`Purchase` goes through purchase dedup + dispatch, other `track`
/// commands through the named-event path, `set`/`userData` updates the
/// visitor's attribution touch. Unknown commands are ignored; the page
/// snippet replays whatever the site calls, and most of it (`init`,
/// `consent`, …) is none of our business.
#[derive(Clone)]
pub struct TrackingPixelSink<D, C, A> {
    pub dedup: D,
    pub conversions: C,
    pub attribution: A,
    pub cadence: PurgeCadence,
    pub dedup_ttl_hours: i64,
}

impl<D, C, A> PixelSink for TrackingPixelSink<D, C, A>
where
    D: DedupRepository + Clone,
    C: ConversionsPort + Clone,
    A: AttributionStore + Clone,
{
    async fn send(&self, call: PixelCall, ctx: &CallContext) -> Result<(), TrackingServiceError> {
        match call.command() {
            Some("track") => self.track(&call, ctx).await,
            Some("set") => self.set_user_data(&call, ctx).await,
            Some(command) => {
                debug!(command, "ignoring pixel command");
                Ok(())
            }
            None => {
                debug!("ignoring malformed pixel call");
                Ok(())
            }
        }
    }
}

impl<D, C, A> TrackingPixelSink<D, C, A>
where
    D: DedupRepository + Clone,
    C: ConversionsPort + Clone,
    A: AttributionStore + Clone,
{
    async fn track(&self, call: &PixelCall, ctx: &CallContext) -> Result<(), TrackingServiceError> {
        let Some(event_name) = call.args.get(1).and_then(Value::as_str) else {
            debug!("ignoring track call without an event name");
            return Ok(());
        };
        let data = call.args.get(2);
        let options = call.args.get(3);
        let value = data.and_then(|d| d.get("value")).and_then(Value::as_f64);
        let currency = data
            .and_then(|d| d.get("currency"))
            .and_then(Value::as_str)
            .map(str::to_owned);

        if event_name == "Purchase" {
            // The enricher has stamped eventID by now; recover the transaction
            // id from either the custom data or the stamped option.
            let transaction_id = data
                .and_then(|d| d.get("transaction_id"))
                .and_then(Value::as_str)
                .map(str::to_owned)
                .or_else(|| {
                    options
                        .and_then(|o| o.get("eventID"))
                        .and_then(Value::as_str)
                        .and_then(|id| id.strip_prefix(PURCHASE_ID_PREFIX))
                        .map(str::to_owned)
                });

            let usecase = RecordPurchaseUseCase {
                dedup: self.dedup.clone(),
                conversions: self.conversions.clone(),
                attribution: self.attribution.clone(),
                cadence: self.cadence.clone(),
                dedup_ttl_hours: self.dedup_ttl_hours,
            };
            let outcome = usecase
                .execute(PurchaseInput {
                    transaction_id,
                    value,
                    currency,
                    source: EventSource::Pixel,
                    visitor_id: ctx.visitor_id.clone(),
                    event_source_url: ctx.source_url.clone(),
                    user: RawUserData::default(),
                    fbp: ctx.fbp.clone(),
                    fbc: ctx.fbc.clone(),
                    ip_address: ctx.ip_address.clone(),
                    user_agent: ctx.user_agent.clone(),
                    event_time: None,
                })
                .await?;
            debug!(
                event_id = %outcome.event_id,
                deduplicated = outcome.deduplicated,
                dispatched = outcome.dispatched,
                "pixel purchase processed"
            );
            return Ok(());
        }

        let usecase = RecordNamedEventUseCase {
            dedup: self.dedup.clone(),
            conversions: self.conversions.clone(),
            attribution: self.attribution.clone(),
            cadence: self.cadence.clone(),
            dedup_ttl_hours: self.dedup_ttl_hours,
        };
        let outcome = usecase
            .execute(NamedEventInput {
                event_name: event_name.to_owned(),
                user_id: ctx.visitor_id.clone(),
                timestamp_ms: None,
                value,
                currency,
                source: EventSource::Pixel,
                visitor_id: ctx.visitor_id.clone(),
                event_source_url: ctx.source_url.clone(),
                user: RawUserData::default(),
                fbp: ctx.fbp.clone(),
                fbc: ctx.fbc.clone(),
                ip_address: ctx.ip_address.clone(),
                user_agent: ctx.user_agent.clone(),
                event_time: None,
            })
            .await?;
        debug!(
            event_id = %outcome.event_id,
            deduplicated = outcome.deduplicated,
            "pixel event processed"
        );
        Ok(())
    }

    async fn set_user_data(
        &self,
        call: &PixelCall,
        ctx: &CallContext,
    ) -> Result<(), TrackingServiceError> {
        if call.args.get(1).and_then(Value::as_str) != Some("userData") {
            debug!("ignoring set call for a key other than userData");
            return Ok(());
        }
        let Some(visitor_id) = ctx.visitor_id.as_deref() else {
            debug!("ignoring set userData without a visitor id");
            return Ok(());
        };

        // Unknown keys are dropped, a non-object payload counts as empty.
        let user = call
            .args
            .get(2)
            .cloned()
            .and_then(|payload| serde_json::from_value::<RawUserData>(payload).ok())
            .unwrap_or_default();

        let usecase = SaveTouchUseCase {
            store: self.attribution.clone(),
        };
        usecase
            .execute(
                visitor_id,
                SaveTouchInput {
                    fbp: ctx.fbp.clone(),
                    fbc: ctx.fbc.clone(),
                    url: ctx.source_url.clone(),
                    user,
                },
            )
            .await
    }
}
