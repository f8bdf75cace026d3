//! Prometheus metrics handler.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::super::types::StatusState;

/// Prometheus-compatible metrics endpoint
///
/// Serves whatever the last cycle published; a scrape never waits on a cycle.
pub async fn metrics_handler(State(state): State<StatusState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
