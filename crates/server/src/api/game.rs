//! Game and turn control handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use orrery_core::multiball::VirtualLockDeficit;

use super::error::ApiError;
use crate::state::AppState;

/// Response for a newly added player
#[derive(Debug, Serialize)]
pub struct AddPlayerResponse {
    /// Index of the new player
    pub player: usize,
}

/// Response for a turn start
#[derive(Debug, Serialize)]
pub struct TurnStartedResponse {
    pub player: usize,
    /// Physical versus credited locks at the start of the turn
    pub deficit: VirtualLockDeficit,
}

/// Response for a lock qualification
#[derive(Debug, Serialize)]
pub struct QualifyResponse {
    /// Whether the qualification lit a new lock
    pub lit: bool,
}

pub async fn start_game(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.engine().start_game().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn end_game(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.engine().end_game().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_player(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<AddPlayerResponse>), ApiError> {
    let player = state.engine().add_player().await?;
    Ok((StatusCode::CREATED, Json(AddPlayerResponse { player })))
}

pub async fn start_turn(
    State(state): State<Arc<AppState>>,
    Path(player): Path<usize>,
) -> Result<Json<TurnStartedResponse>, ApiError> {
    let deficit = state.engine().start_turn(player).await?;
    Ok(Json(TurnStartedResponse { player, deficit }))
}

pub async fn end_turn(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.engine().end_turn().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn qualify_locks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<QualifyResponse>, ApiError> {
    let lit = state.engine().qualify_locks().await?;
    Ok(Json(QualifyResponse { lit }))
}
