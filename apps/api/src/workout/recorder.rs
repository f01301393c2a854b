//! Session Recorder: maps parsed sets to Log Store rows and appends them in one batch.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::WriteError;
use crate::log_store::LogStore;
use crate::models::workout::SetRecord;
use crate::progress::cache::TableCache;
use crate::workout::normalize::title_case;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct SessionRecorder {
    store: Arc<dyn LogStore>,
    cache: Arc<TableCache>,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn LogStore>, cache: Arc<TableCache>) -> Self {
        Self { store, cache }
    }

    /// Records one submission under today's local date.
    pub async fn record(&self, entries: &[SetRecord]) -> Result<usize, WriteError> {
        self.record_on(entries, Local::now().date_naive()).await
    }

    /// Records one submission; every row shares `date`. Exactly one append.
    /// Not idempotent: calling twice writes the rows twice.
    pub async fn record_on(&self, entries: &[SetRecord], date: NaiveDate) -> Result<usize, WriteError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let rows: Vec<Vec<Value>> = entries.iter().map(|e| to_row(e, date)).collect();
        let count = rows.len();

        let result = self.store.append_rows(rows).await;
        self.cache.invalidate();

        match result {
            Ok(()) => {
                info!("Recorded {count} sets for {date}");
                Ok(count)
            }
            Err(source) => {
                warn!("Append of {count} rows failed, resetting log store connection: {source}");
                self.store.reset();
                Err(WriteError { rows: count, source })
            }
        }
    }
}

/// The set as it is stored: exercise name in title case.
pub fn as_written(entry: &SetRecord) -> SetRecord {
    SetRecord {
        exercise: title_case(&entry.exercise),
        ..entry.clone()
    }
}

/// `[date, exercise, weight, reps, notes, muscle_group]`, matching `log_store::COLUMNS`.
pub fn to_row(entry: &SetRecord, date: NaiveDate) -> Vec<Value> {
    vec![
        json!(date.format(DATE_FORMAT).to_string()),
        json!(title_case(&entry.exercise)),
        weight_cell(entry.weight),
        json!(entry.reps),
        json!(entry.notes),
        json!(entry.muscle_group.as_str()),
    ]
}

/// Whole-number weights are written as integers so the sheet shows `60`, not `60.0`.
fn weight_cell(weight: f64) -> Value {
    if weight.fract() == 0.0 && weight.abs() < i64::MAX as f64 {
        json!(weight as i64)
    } else {
        json!(weight)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::log_store::MemoryStore;
    use crate::models::workout::MuscleGroup;

    fn set(exercise: &str, weight: f64, reps: u32) -> SetRecord {
        SetRecord {
            exercise: exercise.to_string(),
            muscle_group: MuscleGroup::Chest,
            weight,
            reps,
            notes: String::new(),
        }
    }

    fn recorder() -> (SessionRecorder, Arc<MemoryStore>, Arc<TableCache>) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(TableCache::new(Duration::from_secs(60)));
        (SessionRecorder::new(store.clone(), cache.clone()), store, cache)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[tokio::test]
    async fn test_k_entries_one_append_one_date() {
        let (recorder, store, _) = recorder();
        let entries = vec![set("bench", 60.0, 10), set("bench", 62.5, 8), set("fly", 14.0, 12)];

        let count = recorder.record_on(&entries, date()).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.append_calls(), 1);

        let rows = store.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r[0] == json!("2024-05-17")));
    }

    #[tokio::test]
    async fn test_row_layout_and_title_case() {
        let (recorder, store, _) = recorder();
        let mut entry = set("incline DUMBBELL press", 22.5, 10);
        entry.notes = "slow negatives".to_string();

        recorder.record_on(&[entry], date()).await.unwrap();
        assert_eq!(
            store.rows()[0],
            vec![
                json!("2024-05-17"),
                json!("Incline Dumbbell Press"),
                json!(22.5),
                json!(10),
                json!("slow negatives"),
                json!("Chest"),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_submission_touches_nothing() {
        let (recorder, store, _) = recorder();
        assert_eq!(recorder.record_on(&[], date()).await.unwrap(), 0);
        assert_eq!(store.append_calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_surfaces_error_and_resets_store() {
        let (recorder, store, cache) = recorder();
        cache.put(Default::default());
        store.set_unavailable(true);

        let err = recorder.record_on(&[set("Squat", 100.0, 5)], date()).await.unwrap_err();
        assert_eq!(err.rows, 1);
        assert_eq!(store.append_calls(), 1);
        assert_eq!(store.reset_calls(), 1);
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn test_success_invalidates_cache() {
        let (recorder, _, cache) = recorder();
        cache.put(Default::default());
        recorder.record_on(&[set("Squat", 100.0, 5)], date()).await.unwrap();
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn test_recording_twice_duplicates_rows() {
        let (recorder, store, _) = recorder();
        let entries = vec![set("Squat", 100.0, 5)];
        recorder.record_on(&entries, date()).await.unwrap();
        recorder.record_on(&entries, date()).await.unwrap();
        assert_eq!(store.rows().len(), 2);
    }

    #[test]
    fn test_weight_cell() {
        assert_eq!(weight_cell(60.0), json!(60));
        assert_eq!(weight_cell(2.5), json!(2.5));
        assert_eq!(weight_cell(0.0), json!(0));
    }

    #[test]
    fn test_as_written_matches_stored_exercise() {
        let entry = set("romanian deadlift", 80.0, 8);
        let written = as_written(&entry);
        assert_eq!(written.exercise, "Romanian Deadlift");
        assert_eq!(to_row(&entry, date())[1], json!(written.exercise));
        assert_eq!(written.weight, entry.weight);
    }
}
