use axum::{
    Router,
    routing::{get, post},
};

use rastro_core::health::{healthz, readyz};
use rastro_core::middleware::{request_id_layer, trace_layer};

use crate::handlers::{
    attribution::{get_touch, save_touch},
    collect::collect,
    events::{create_named_event, create_purchase_event, get_event, list_transaction_events},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Pixel collection
        .route("/collect", post(collect))
        // Server-side events
        .route("/events", post(create_named_event))
        .route("/events/purchase", post(create_purchase_event))
        .route("/events/{event_id}", get(get_event))
        .route(
            "/transactions/{transaction_id}/events",
            get(list_transaction_events),
        )
        // Attribution
        .route("/attribution/{visitor_id}", get(get_touch))
        .route("/attribution/{visitor_id}/touch", post(save_touch))
        .layer(trace_layer())
        .layer(request_id_layer())
        .with_state(state)
}
