use axum::http::StatusCode;

/// Handler for `GET /healthz` — liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz` — readiness check.
///
/// Services construct their sinks before binding the listener, so reaching
/// this handler already implies the process came up with its dependencies.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}
