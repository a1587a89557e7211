use ai_llm_service::AiLlmError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use query_engine::QueryError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] AiLlmError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Pipeline failure; status depends on whether the caller or the model is at fault.
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Query(QueryError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,

            // model side
            AppError::Query(QueryError::Model(_) | QueryError::EmptyAnswer) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Query(QueryError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,

            // startup-only
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Query(QueryError::Validation(_)) => "VALIDATION_ERROR",
            AppError::Query(QueryError::Model(_) | QueryError::EmptyAnswer) => "MODEL_ERROR",
            AppError::Query(QueryError::Timeout(_)) => "MODEL_TIMEOUT",
        }
    }
}

/// `detail` repeats `message` for clients that read the single-field shape.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(%status, code = self.error_code(), error = %message, "request failed");
        } else {
            warn!(%status, code = self.error_code(), error = %message, "request rejected");
        }

        let body = ErrorBody {
            error: self.error_code(),
            detail: message.clone(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}
