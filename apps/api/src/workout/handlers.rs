use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::workout::SetRecord;
use crate::state::AppState;
use crate::workout::recorder::as_written;

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub raw_text: String,
}

#[derive(Debug, Serialize)]
pub struct SessionPreviewResponse {
    pub sets: Vec<SetRecord>,
}

#[derive(Debug, Serialize)]
pub struct SessionLoggedResponse {
    pub added: usize,
    pub sets: Vec<SetRecord>,
}

fn validate(req: &SessionRequest) -> Result<&str, AppError> {
    let text = req.raw_text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("raw_text must not be empty".to_string()));
    }
    Ok(text)
}

/// POST /api/v1/sessions/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionPreviewResponse>, AppError> {
    let text = validate(&req)?;
    let sets = state.parser.parse(text).await?;
    Ok(Json(SessionPreviewResponse { sets }))
}

/// POST /api/v1/sessions
pub async fn handle_log_session(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<(StatusCode, Json<SessionLoggedResponse>), AppError> {
    let text = validate(&req)?;
    let sets: Vec<SetRecord> = state.parser.parse(text).await?.iter().map(as_written).collect();

    let added = state.recorder.record(&sets).await?;

    Ok((StatusCode::CREATED, Json(SessionLoggedResponse { added, sets })))
}
