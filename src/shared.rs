use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::SettingsStore;
use crate::monitor::LcuRuntime;
use crate::score::ConfigStore;

/// Shared application state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<LcuRuntime>,
    pub scores: ConfigStore,
    pub settings: SettingsStore,
}

impl AppState {
    pub fn new(runtime: Arc<LcuRuntime>, scores: ConfigStore, settings: SettingsStore) -> Self {
        Self {
            runtime,
            scores,
            settings,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("check that the game client is running")]
    ClientInactive,

    #[error("{0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("system error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ClientInactive => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

impl From<crate::lcu::LcuError> for AppError {
    fn from(_: crate::lcu::LcuError) -> Self {
        AppError::Internal
    }
}
