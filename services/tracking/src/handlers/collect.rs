use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::dispatch::{CallContext, PixelCall, PixelSink as _};
use crate::state::AppState;

// ── Request/response types ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CollectRequest {
    pub visitor_id: Option<String>,
    /// Page URL the calls were captured on.
    pub source_url: Option<String>,
    /// Explicit browser ids win over the `_fbp`/`_fbc` cookies.
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    /// Raw `fbq(...)` argument lists, one per call, in page order.
    pub calls: Vec<Vec<Value>>,
}

#[derive(Serialize)]
pub struct CollectResponse {
    pub received: usize,
    pub dropped: usize,
}

// ── Handler ──────────────────────────────────────────────────────────────────

/// POST /collect — batch of pixel calls replayed by the page snippet.
///
/// Always 202: the batch is accepted as a whole and each call is processed
/// independently; a failing call is counted in `dropped`, never surfaced as
/// an HTTP error.
pub async fn collect(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(body): Json<CollectRequest>,
) -> (StatusCode, Json<CollectResponse>) {
    let ctx = CallContext {
        visitor_id: body.visitor_id,
        fbp: body.fbp.or_else(|| cookie_value(&jar, "_fbp")),
        fbc: body.fbc.or_else(|| cookie_value(&jar, "_fbc")),
        ip_address: client_ip(&headers),
        user_agent: header_value(&headers, header::USER_AGENT),
        source_url: body.source_url,
    };

    let sink = state.pixel_sink();
    let mut received = 0usize;
    let mut dropped = 0usize;
    for args in body.calls {
        match sink.send(PixelCall::new(args), &ctx).await {
            Ok(()) => received += 1,
            Err(error) => {
                warn!(%error, "pixel call dropped");
                dropped += 1;
            }
        }
    }

    (
        StatusCode::ACCEPTED,
        Json(CollectResponse { received, dropped }),
    )
}

fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|cookie| cookie.value().to_owned())
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// First hop of `x-forwarded-for`: the client as seen by the edge proxy.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
