//! Liveness probe.

use axum::extract::State;
use axum::Json;

use crate::api::types::HealthResponse;
use crate::clock::to_iso8601;
use crate::http::server::AppState;

pub const SERVER_NAME: &str = "neightn-backend";

/// `GET /health`. Never calls upstream.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: to_iso8601(&state.clock.utc_now()),
        server: SERVER_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}
