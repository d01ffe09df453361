//! Stateless endpoints the game client expects on the main port.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use crate::observability::metrics;

const LOG_EVENT_OK: &str = r#"<?xml version="1.0" encoding="utf-8"?><boolean>true</boolean>"#;

/// Analytics sink. Events are accepted and dropped.
pub async fn log_event() -> impl IntoResponse {
    metrics::record_app_request("log_event", 200);
    ([(header::CONTENT_TYPE, "application/xml")], LOG_EVENT_OK)
}

/// Liveness probe.
pub async fn ping() -> StatusCode {
    metrics::record_app_request("ping", 200);
    StatusCode::OK
}
