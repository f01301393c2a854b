pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::progress::handlers as progress;
use crate::state::AppState;
use crate::workout::handlers as workout;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Logging
        .route("/api/v1/sessions", post(workout::handle_log_session))
        .route("/api/v1/sessions/preview", post(workout::handle_preview))
        // Reporting
        .route("/api/v1/logs", get(progress::handle_logs))
        .route("/api/v1/exercises", get(progress::handle_exercises))
        .route("/api/v1/progress", get(progress::handle_progress))
        .route("/api/v1/muscle-groups", get(progress::handle_muscle_groups))
        .route("/api/v1/activity", get(progress::handle_activity))
        .with_state(state)
}
