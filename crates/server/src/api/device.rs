//! Ball-lock device and trough handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use orrery_core::{LaunchPlan, RecoveryOutcome};

use super::error::ApiError;
use crate::state::AppState;

/// Request body for an eject
#[derive(Debug, Deserialize)]
pub struct EjectBody {
    /// Balls to release from the holder
    pub count: u32,
}

/// Response for an eject
#[derive(Debug, Serialize)]
pub struct EjectResponse {
    pub requested: u32,
    /// Balls actually queued for release (never more than are retained)
    pub accepted: u32,
}

/// Request body for a trough launch
#[derive(Debug, Deserialize)]
pub struct LaunchBody {
    pub count: u32,
    /// Feed the balls toward the holder without adding them to the
    /// player-visible count
    #[serde(default)]
    pub stealth: bool,
}

/// Response for a ball search
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub outcome: RecoveryOutcome,
}

pub async fn eject(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EjectBody>,
) -> Result<Json<EjectResponse>, ApiError> {
    let accepted = state.engine().eject(body.count).await?;
    Ok(Json(EjectResponse {
        requested: body.count,
        accepted,
    }))
}

pub async fn ball_search(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SearchResponse>, ApiError> {
    let outcome = state.engine().ball_search().await?;
    Ok(Json(SearchResponse { outcome }))
}

pub async fn launch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LaunchBody>,
) -> Result<Json<LaunchPlan>, ApiError> {
    Ok(Json(state.engine().launch(body.count, body.stealth).await?))
}
