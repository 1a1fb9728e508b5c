use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use orrery_core::{MachineSnapshot, SanitizedConfig};

use super::error::ApiError;
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Full machine snapshot: game, device, ledger and multiball state.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MachineSnapshot>, ApiError> {
    Ok(Json(state.engine().snapshot().await?))
}

/// Prometheus scrape endpoint.
///
/// Ball gauges are refreshed from a fresh snapshot first. If the engine is
/// gone the static counters are still served.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Ok(snapshot) = state.engine().snapshot().await {
        collect_dynamic_metrics(&snapshot);
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
