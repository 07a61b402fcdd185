//! In-process mock of the ad platform's Conversions API.
//!
//! Records every request it receives so tests can assert on the exact wire
//! payload (hashed match keys, event ids, test event codes) without touching
//! the real endpoint.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use serde_json::{Value, json};

/// One captured `POST /{pixel_id}/events` request.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub pixel_id: String,
    pub query: String,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    respond_with: StatusCode,
}

/// Recording Conversions API double listening on a random local port.
pub struct MockCapiServer {
    pub base_url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockCapiServer {
    /// Start a server that accepts every event.
    pub async fn start() -> Self {
        Self::start_with_status(StatusCode::OK).await
    }

    /// Start a server that rejects every event with a 500.
    pub async fn start_failing() -> Self {
        Self::start_with_status(StatusCode::INTERNAL_SERVER_ERROR).await
    }

    async fn start_with_status(respond_with: StatusCode) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            calls: Arc::clone(&calls),
            respond_with,
        };
        let app = Router::new()
            .route("/{pixel_id}/events", post(record))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            calls,
        }
    }

    /// Snapshot of everything received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<MockState>,
    Path(pixel_id): Path<String>,
    RawQuery(query): RawQuery,
    axum::Json(body): axum::Json<Value>,
) -> impl IntoResponse {
    state.calls.lock().unwrap().push(RecordedCall {
        pixel_id,
        query: query.unwrap_or_default(),
        body,
    });
    (state.respond_with, axum::Json(json!({ "events_received": 1 })))
}
