use anyhow::bail;
use serde_json::Value;
use tracing::warn;

use rastro_domain::event_id::purchase_event_id;

use crate::dispatch::{CallContext, PixelCall, PixelSink};
use crate::error::TrackingServiceError;

/// Keys removed from `set`/`userData` payloads, compared case-insensitively.
const FORBIDDEN_SET_KEYS: [&str; 1] = ["pixel_id"];

/// A `set`/`userData` call is `("set", "userData", payload)` — anything past
/// the payload is noise from a misbehaving snippet.
const MAX_SET_ARGS: usize = 3;

/// An enricher may rewrite the argument list (`Ok(Some(args))`), decline
/// (`Ok(None)`), or fail (`Err`, logged and skipped).
pub type Enricher =
    Box<dyn Fn(&[Value], &CallContext) -> anyhow::Result<Option<Vec<Value>>> + Send + Sync>;

/// Decorator that cleans pixel calls before they reach the inner sink.
///
/// Enrichers run first, in registration order; then forbidden keys are
/// stripped and oversized `set` calls are capped. If the sanitized result is
/// malformed, the original call is forwarded unchanged: delivery beats
/// filtering.
pub struct SanitizedSink<S> {
    inner: S,
    enrichers: Vec<Enricher>,
}

impl<S: PixelSink> SanitizedSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            enrichers: Vec::new(),
        }
    }

    pub fn register<F>(&mut self, enricher: F)
    where
        F: Fn(&[Value], &CallContext) -> anyhow::Result<Option<Vec<Value>>>
            + Send
            + Sync
            + 'static,
    {
        self.enrichers.push(Box::new(enricher));
    }

    fn sanitize(&self, call: &PixelCall, ctx: &CallContext) -> anyhow::Result<PixelCall> {
        let mut args = call.args.clone();

        for (index, enricher) in self.enrichers.iter().enumerate() {
            match enricher(&args, ctx) {
                Ok(Some(replacement)) => args = replacement,
                Ok(None) => {}
                Err(error) => {
                    warn!(enricher = index, error = %error, "enricher failed, skipping it");
                }
            }
        }

        if is_set_user_data(&args) {
            if let Some(Value::Object(payload)) = args.get_mut(2) {
                payload.retain(|key, _| {
                    !FORBIDDEN_SET_KEYS
                        .iter()
                        .any(|forbidden| key.eq_ignore_ascii_case(forbidden))
                });
            }
            args.truncate(MAX_SET_ARGS);
        }

        match args.first() {
            Some(Value::String(_)) => Ok(PixelCall::new(args)),
            _ => bail!("sanitized call lost its command"),
        }
    }
}

impl<S: PixelSink> PixelSink for SanitizedSink<S> {
    async fn send(&self, call: PixelCall, ctx: &CallContext) -> Result<(), TrackingServiceError> {
        match self.sanitize(&call, ctx) {
            Ok(clean) => self.inner.send(clean, ctx).await,
            Err(error) => {
                warn!(error = %error, "sanitize failed, forwarding the original call");
                self.inner.send(call, ctx).await
            }
        }
    }
}

fn is_set_user_data(args: &[Value]) -> bool {
    args.first().and_then(Value::as_str) == Some("set")
        && args.get(1).and_then(Value::as_str) == Some("userData")
}

/// Default enricher: stamps the dedup `eventID` into the options of
/// `track`/`Purchase` calls that lack one, so the browser and server
/// submissions of the same purchase collide in the ledger.
pub fn enrich_purchase_event_id(
    args: &[Value],
    _ctx: &CallContext,
) -> anyhow::Result<Option<Vec<Value>>> {
    if args.first().and_then(Value::as_str) != Some("track")
        || args.get(1).and_then(Value::as_str) != Some("Purchase")
    {
        return Ok(None);
    }
    if args.get(3).and_then(|options| options.get("eventID")).is_some() {
        return Ok(None);
    }
    let Some(transaction_id) = args
        .get(2)
        .and_then(|data| data.get("transaction_id"))
        .and_then(Value::as_str)
    else {
        return Ok(None);
    };

    let event_id = purchase_event_id(Some(transaction_id));
    let mut enriched = args.to_vec();
    match enriched.get_mut(3) {
        Some(Value::Object(options)) => {
            options.insert("eventID".to_owned(), Value::String(event_id));
        }
        Some(other) => *other = serde_json::json!({ "eventID": event_id }),
        None => enriched.push(serde_json::json!({ "eventID": event_id })),
    }
    Ok(Some(enriched))
}
