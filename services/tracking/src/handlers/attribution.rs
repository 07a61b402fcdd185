use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use rastro_domain::attribution::UtmParams;
use rastro_domain::normalize::{NormalizedUserData, RawUserData};

use crate::domain::types::AttributionTouch;
use crate::error::TrackingServiceError;
use crate::state::AppState;
use crate::usecase::attribution::{ResolveTouchUseCase, SaveTouchInput, SaveTouchUseCase};

// ── Request/response types ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TouchRequest {
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    /// Full landing-page URL; UTM parameters are read from its query string.
    pub url: Option<String>,
    #[serde(default)]
    pub user: RawUserData,
}

#[derive(Serialize)]
pub struct TouchResponse {
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub utm: UtmParams,
    pub user: NormalizedUserData,
    #[serde(serialize_with = "rastro_core::serde::to_rfc3339_ms")]
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl From<AttributionTouch> for TouchResponse {
    fn from(touch: AttributionTouch) -> Self {
        Self {
            fbp: touch.fbp,
            fbc: touch.fbc,
            utm: touch.utm,
            user: touch.user,
            captured_at: touch.captured_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /attribution/{visitor_id}/touch — store a landing-page touch.
pub async fn save_touch(
    State(state): State<AppState>,
    Path(visitor_id): Path<String>,
    Json(body): Json<TouchRequest>,
) -> Result<StatusCode, TrackingServiceError> {
    let uc = SaveTouchUseCase {
        store: state.attribution_store(),
    };

    uc.execute(
        &visitor_id,
        SaveTouchInput {
            fbp: body.fbp,
            fbc: body.fbc,
            url: body.url,
            user: body.user,
        },
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /attribution/{visitor_id} — resolve the stored touch.
pub async fn get_touch(
    State(state): State<AppState>,
    Path(visitor_id): Path<String>,
) -> Result<Json<TouchResponse>, TrackingServiceError> {
    let uc = ResolveTouchUseCase {
        store: state.attribution_store(),
    };

    let touch = uc.execute(&visitor_id).await?;
    Ok(Json(touch.into()))
}
