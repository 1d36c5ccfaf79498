use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use trigger_engine::{EventError, TriggerEngineError};

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot ---
    #[error("engine setup failed: {0}")]
    Engine(#[source] TriggerEngineError),

    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    /// Body is not a decodable webhook; answered as plain text.
    #[error("{0}")]
    Decode(String),

    /// Merge request state no trigger rule can be keyed by.
    #[error("unsupported merge request state: {0}")]
    UnsupportedState(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Engine(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Engine(_) => "ENGINE_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Decode(_) => "BAD_REQUEST",
            AppError::UnsupportedState(_) => "UNSUPPORTED_STATE",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let AppError::Decode(msg) = self {
            return (status, msg).into_response();
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<TriggerEngineError> for AppError {
    fn from(err: TriggerEngineError) -> Self {
        match err {
            TriggerEngineError::Event(EventError::Decode(e)) => AppError::Decode(e.to_string()),
            TriggerEngineError::Event(EventError::UnsupportedState(s)) => {
                AppError::UnsupportedState(s)
            }
            other => AppError::Engine(other),
        }
    }
}
