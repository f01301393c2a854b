use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::log_store::StoreError;

/// Why a submission could not be turned into set records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailure {
    /// Every configured model was unreachable or rejected the request.
    ServiceUnavailable,
    /// The response was not a non-empty JSON array of objects.
    MalformedOutput,
}

/// Terminal failure of `WorkoutParser::parse`. Never carries a partial list.
#[derive(Debug, Error)]
#[error("{reason:?}: {detail}")]
pub struct ParseError {
    pub reason: ParseFailure,
    pub detail: String,
}

impl ParseError {
    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self {
            reason: ParseFailure::ServiceUnavailable,
            detail: detail.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            reason: ParseFailure::MalformedOutput,
            detail: detail.into(),
        }
    }
}

/// The batch append to the Log Store failed. Nothing is retried.
#[derive(Debug, Error)]
#[error("Failed to append {rows} rows: {source}")]
pub struct WriteError {
    pub rows: usize,
    #[source]
    pub source: StoreError,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Parse(e) => match e.reason {
                ParseFailure::ServiceUnavailable => {
                    tracing::error!("Extraction service unavailable: {}", e.detail);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "SERVICE_UNAVAILABLE",
                        "The AI service is unavailable. Try again later.".to_string(),
                    )
                }
                ParseFailure::MalformedOutput => {
                    tracing::warn!("Extraction output malformed: {}", e.detail);
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "MALFORMED_OUTPUT",
                        "AI missed that. Try again.".to_string(),
                    )
                }
            },
            AppError::Write(e) => {
                tracing::error!("Log store write error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "WRITE_ERROR",
                    format!("Could not save the workout: {}", e.source),
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
