//! Progress aggregates derived from the Log Store table. Nothing here is persisted.
//!
//! All aggregates key on the row's date, not its position in the store, so a
//! permuted table gives the same answer.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::workout::{LogTable, LoggedSet, MuscleGroup};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DatePoint {
    pub date: NaiveDate,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressSummary {
    /// All-time personal record over the series.
    pub max_weight: Option<f64>,
    /// Peak weight of the most recent date in the series.
    pub last_weight: Option<f64>,
    /// Date-ascending; sets on one day collapse to that day's peak.
    pub per_date_max_weight: Vec<DatePoint>,
    /// Rows matching the filter, including rows excluded from the series.
    pub set_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MuscleGroupCount {
    pub muscle_group: MuscleGroup,
    pub sets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub sets: usize,
}

/// Progress for the rows matching `exercise` (case-insensitive) and `muscle_group`.
/// `None` filters match everything.
pub fn summarize(
    table: &LogTable,
    exercise: Option<&str>,
    muscle_group: Option<MuscleGroup>,
) -> ProgressSummary {
    let exercise = exercise.map(str::trim).filter(|e| !e.is_empty());
    let matching: Vec<&LoggedSet> = table
        .rows
        .iter()
        .filter(|row| exercise.map_or(true, |e| row.exercise.eq_ignore_ascii_case(e)))
        .filter(|row| muscle_group.map_or(true, |g| row.muscle_group == g))
        .collect();

    let mut peaks: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in &matching {
        if let (Some(date), Some(weight)) = (row.date, row.weight) {
            peaks
                .entry(date)
                .and_modify(|peak| *peak = peak.max(weight))
                .or_insert(weight);
        }
    }

    let per_date_max_weight: Vec<DatePoint> = peaks
        .into_iter()
        .map(|(date, weight)| DatePoint { date, weight })
        .collect();

    ProgressSummary {
        max_weight: per_date_max_weight
            .iter()
            .map(|p| p.weight)
            .reduce(f64::max),
        last_weight: per_date_max_weight.last().map(|p| p.weight),
        per_date_max_weight,
        set_count: matching.len(),
    }
}

/// Sorted, de-duplicated exercise names for a selection list.
pub fn exercises(table: &LogTable) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|row| row.exercise.trim())
        .filter(|e| !e.is_empty())
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sets logged per muscle group, most-trained first.
pub fn muscle_group_counts(table: &LogTable) -> Vec<MuscleGroupCount> {
    let mut counts: HashMap<MuscleGroup, usize> = HashMap::new();
    for row in &table.rows {
        *counts.entry(row.muscle_group).or_default() += 1;
    }
    let mut counts: Vec<MuscleGroupCount> = counts
        .into_iter()
        .map(|(muscle_group, sets)| MuscleGroupCount { muscle_group, sets })
        .collect();
    counts.sort_by(|a, b| b.sets.cmp(&a.sets).then(a.muscle_group.cmp(&b.muscle_group)));
    counts
}

/// Sets logged per date, ascending. Rows without a readable date are skipped.
pub fn sets_per_date(table: &LogTable) -> Vec<DateCount> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in table.rows.iter().filter_map(|row| row.date) {
        *counts.entry(date).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(date, sets)| DateCount { date, sets })
        .collect()
}
