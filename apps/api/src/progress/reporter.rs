//! Progress Reporter: reads the whole Log Store back, with a short-lived cache.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, warn};

use crate::log_store::{field, LogStore, Record};
use crate::models::workout::{LogTable, LoggedSet, MuscleGroup};
use crate::progress::cache::TableCache;

#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<dyn LogStore>,
    cache: Arc<TableCache>,
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn LogStore>, cache: Arc<TableCache>) -> Self {
        Self { store, cache }
    }

    /// All rows, coerced. An unreachable store reads as an empty table;
    /// empty results are not cached so the next call tries again.
    pub async fn load_all(&self) -> Arc<LogTable> {
        if let Some(table) = self.cache.get() {
            debug!("Serving {} rows from cache", table.len());
            return table;
        }

        match self.store.read_records().await {
            Ok(records) => {
                let table = LogTable {
                    rows: records.iter().map(logged_set_from_record).collect(),
                };
                if table.is_empty() {
                    Arc::new(table)
                } else {
                    debug!("Loaded {} rows from log store", table.len());
                    self.cache.put(table)
                }
            }
            Err(e) => {
                warn!("Log store read failed, showing no data: {e}");
                Arc::new(LogTable::default())
            }
        }
    }
}

/// Coerces one header-keyed record. Tolerates the older schemas: a full
/// timestamp in the date column, and no muscle-group column at all.
pub fn logged_set_from_record(record: &Record) -> LoggedSet {
    LoggedSet {
        date: field(record, "date").and_then(coerce_date),
        exercise: field(record, "exercise").map(cell_text).unwrap_or_default(),
        weight: field(record, "weight")
            .and_then(coerce_number)
            .filter(|w| *w >= 0.0),
        reps: field(record, "reps")
            .and_then(coerce_number)
            .filter(|r| *r >= 0.0 && r.fract() == 0.0 && *r <= u32::MAX as f64)
            .map(|r| r as u32),
        notes: field(record, "notes").map(cell_text).unwrap_or_default(),
        muscle_group: match field(record, "muscle_group").map(cell_text) {
            None => MuscleGroup::Uncategorized,
            Some(label) if label.is_empty() => MuscleGroup::Uncategorized,
            Some(label) => MuscleGroup::from_label(&label).unwrap_or(MuscleGroup::Other),
        },
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Strict numeric coercion: anything that is not a plain number is missing.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn coerce_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s.trim()),
        // Spreadsheet serial day number (unformatted date cell).
        Value::Number(n) => {
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            let days = n.as_f64()?.floor();
            epoch.checked_add_signed(Duration::try_days(days as i64)?)
        }
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(s, "%m/%d/%Y").ok())
}
