use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::workout::{LogTable, MuscleGroup};
use crate::progress::summary::{
    exercises, muscle_group_counts, sets_per_date, summarize, DateCount, MuscleGroupCount,
    ProgressSummary,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub exercise: Option<String>,
    pub muscle_group: Option<String>,
}

/// GET /api/v1/logs
pub async fn handle_logs(State(state): State<AppState>) -> Json<LogTable> {
    let table = state.reporter.load_all().await;
    Json(LogTable::clone(&table))
}

/// GET /api/v1/exercises
pub async fn handle_exercises(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(exercises(&*state.reporter.load_all().await))
}

/// GET /api/v1/progress
pub async fn handle_progress(
    State(state): State<AppState>,
    Query(params): Query<ProgressQuery>,
) -> Result<Json<ProgressSummary>, AppError> {
    let muscle_group = match params.muscle_group.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(label) => Some(MuscleGroup::from_label(label).ok_or_else(|| {
            AppError::Validation(format!("unknown muscle group '{label}'"))
        })?),
    };

    let table = state.reporter.load_all().await;
    Ok(Json(summarize(&table, params.exercise.as_deref(), muscle_group)))
}

/// GET /api/v1/muscle-groups
pub async fn handle_muscle_groups(State(state): State<AppState>) -> Json<Vec<MuscleGroupCount>> {
    Json(muscle_group_counts(&*state.reporter.load_all().await))
}

/// GET /api/v1/activity
pub async fn handle_activity(State(state): State<AppState>) -> Json<Vec<DateCount>> {
    Json(sets_per_date(&*state.reporter.load_all().await))
}
