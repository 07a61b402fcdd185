use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error surface of the tracking service. Everything a handler can fail with
/// maps onto one of these; the HTTP layer renders them as `{kind, message}`.
#[derive(Debug, thiserror::Error)]
pub enum TrackingServiceError {
    #[error("event not found")]
    EventNotFound,

    #[error("attribution touch not found")]
    TouchNotFound,

    #[error("{0}")]
    InvalidEvent(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl TrackingServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::TouchNotFound => "TOUCH_NOT_FOUND",
            Self::InvalidEvent(_) => "INVALID_EVENT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::EventNotFound | Self::TouchNotFound => StatusCode::NOT_FOUND,
            Self::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrackingServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log 500s only — client errors are the caller's problem.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal service error");
        }

        let body = Json(json!({
            "kind": self.kind(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
