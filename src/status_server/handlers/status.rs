//! JSON status handler.

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};

use super::super::types::{StatusResponse, StatusState};
use crate::error_handling::EventType;

/// JSON status endpoint with cycle and cache information
pub async fn status_handler(State(state): State<StatusState>) -> Response {
    let response = StatusResponse {
        uptime_seconds: state.start_time.elapsed().as_secs_f64(),
        cycles_completed: state.stats.get(EventType::CycleCompleted),
        cycles_aborted: state.stats.get(EventType::CycleAborted),
        snapshot_size: state.reconciler.snapshot_len(),
        geo_cache_size: state.reconciler.geo_cache().len(),
        last_cycle: state.reconciler.last_cycle(),
        events: state.stats.as_map(),
    };

    Json(response).into_response()
}
