//! Error responses shared by the machine control handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use orrery_core::MachineError;

use crate::engine::EngineError;

/// Error body returned by every failing API call.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A status code paired with a message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Machine(MachineError::UnknownPlayer(_)) => StatusCode::NOT_FOUND,
            EngineError::Machine(MachineError::PlayerLimit(_)) => StatusCode::BAD_REQUEST,
            EngineError::Machine(_) => StatusCode::CONFLICT,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
