use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use palisade_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Ledger data unavailable: {0}")]
    DataUnavailable(String),

    /// Should not occur under correct use; readers treat a corrupt entry as
    /// a miss and recompute, so this never reaches a caller of the
    /// reputation API.
    #[error("Cache corruption: {0}")]
    CacheCorruption(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => AppError::InvalidInput(msg),
            CoreError::InvalidConfig(msg) => AppError::Config(msg),
            CoreError::Parse(msg) | CoreError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::InvalidInput(msg) => {
                tracing::warn!(message = %msg, error_code = "INVALID_INPUT", "Invalid input");
                (StatusCode::BAD_REQUEST, "INVALID_INPUT")
            }
            AppError::DataUnavailable(msg) => {
                tracing::error!(message = %msg, error_code = "DATA_UNAVAILABLE", "Ledger data unavailable");
                (StatusCode::BAD_GATEWAY, "DATA_UNAVAILABLE")
            }
            AppError::CacheCorruption(msg) => {
                tracing::error!(message = %msg, error_code = "CACHE_CORRUPTION", "Cache corruption detected");
                (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_CORRUPTION")
            }
            AppError::Config(msg) => {
                tracing::error!(message = %msg, error_code = "CONFIG_ERROR", "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
            }
            AppError::Internal(msg) => {
                tracing::error!(message = %msg, error_code = "INTERNAL_ERROR", "Internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
