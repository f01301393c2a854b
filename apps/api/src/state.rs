use crate::progress::reporter::ProgressReporter;
use crate::workout::parser::WorkoutParser;
use crate::workout::recorder::SessionRecorder;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once by the composition root; every client inside is long-lived.
#[derive(Clone)]
pub struct AppState {
    pub parser: WorkoutParser,
    pub recorder: SessionRecorder,
    pub reporter: ProgressReporter,
}
