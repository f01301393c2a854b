//! Log Store: the append-only table that is the system of record.
//!
//! `SheetsStore` talks to Google Sheets; `MemoryStore` keeps the same table in
//! process for local runs and tests. Both are carried as `Arc<dyn LogStore>`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod auth;
pub mod memory;
pub mod sheets;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use sheets::SheetsStore;

/// Header row, in the fixed left-to-right column order rows are written in.
pub const COLUMNS: [&str; 6] = ["Date", "Exercise", "Weight", "Reps", "Notes", "Muscle Group"];

/// One row keyed by its header cell, as `get_all_records` style reads return it.
pub type Record = HashMap<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Spreadsheet not found: {0}")]
    NotFound(String),

    #[error("Log store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LogStore: Send + Sync {
    /// Appends all rows in one request. Rows follow `COLUMNS` order.
    async fn append_rows(&self, rows: Vec<Vec<Value>>) -> Result<(), StoreError>;

    /// Reads every data row, keyed by the header row.
    async fn read_records(&self) -> Result<Vec<Record>, StoreError>;

    /// Drops any cached credentials or resolved handles so the next call
    /// rebuilds them. Called after a failed write.
    fn reset(&self);
}

/// Canonical form of a header cell: lowercase, spaces and hyphens become underscores.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

/// Looks up a column in a record by its canonical header name.
pub fn field<'a>(record: &'a Record, name: &str) -> Option<&'a Value> {
    let wanted = normalize_header(name);
    record
        .iter()
        .find(|(k, _)| normalize_header(k) == wanted)
        .map(|(_, v)| v)
}

/// Turns a header row plus data rows into header-keyed records.
/// Short rows are padded with empty strings; fully blank rows are dropped.
pub fn records_from_rows(mut rows: Vec<Vec<Value>>) -> Vec<Record> {
    if rows.is_empty() {
        return Vec::new();
    }
    let header: Vec<String> = rows
        .remove(0)
        .into_iter()
        .map(|cell| match cell {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect();

    rows.into_iter()
        .filter(|row| row.iter().any(|cell| !is_blank(cell)))
        .map(|mut row| {
            row.resize(header.len(), Value::String(String::new()));
            header
                .iter()
                .zip(row)
                .filter(|(h, _)| !h.trim().is_empty())
                .map(|(h, cell)| (h.clone(), cell))
                .collect()
        })
        .collect()
}

fn is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
