//! Switch injection for driver bridges and bench testing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use orrery_core::{Switch, SwitchEvent, SwitchState};

use super::error::ApiError;
use crate::state::AppState;

/// Request body for a switch transition
#[derive(Debug, Deserialize)]
pub struct SwitchBody {
    pub state: SwitchState,
}

/// Queue one debounced switch transition.
///
/// Returns 202: the event is applied by the engine in arrival order.
pub async fn post_switch(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<SwitchBody>,
) -> Result<StatusCode, ApiError> {
    let switch: Switch = name
        .parse()
        .map_err(|e: orrery_core::hardware::UnknownSwitch| ApiError::not_found(e.to_string()))?;

    state
        .engine()
        .switch(SwitchEvent {
            switch,
            state: body.state,
        })
        .await?;

    Ok(StatusCode::ACCEPTED)
}
