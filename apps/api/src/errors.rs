use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::GenerationError;
use crate::profile::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A flow step was invoked before the step it depends on.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    /// The provider returned valid JSON that lacks a field the flow needs.
    #[error("Generation shape error: {0}")]
    GenerationShape(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::QuotaExceeded { .. } => AppError::QuotaExceeded(err.to_string()),
            GenerationError::Failure { .. } => AppError::Generation(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidPatch(e) => AppError::Validation(e.to_string()),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PreconditionFailed(_) => StatusCode::FORBIDDEN,
            AppError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            AppError::GenerationShape(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::BadRequest(msg) => ("BAD_REQUEST", msg.clone()),
            AppError::PreconditionFailed(msg) => ("PRECONDITION_FAILED", msg.clone()),
            AppError::QuotaExceeded(msg) => {
                tracing::warn!("Provider quota exceeded: {msg}");
                (
                    "QUOTA_EXCEEDED",
                    "AI service quota exceeded. Please try again later.".to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("Generation error: {msg}");
                ("GENERATION_FAILED", msg.clone())
            }
            AppError::GenerationShape(msg) => {
                tracing::error!("Generation shape error: {msg}");
                ("GENERATION_FAILED", msg.clone())
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
