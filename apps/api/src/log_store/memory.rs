use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{records_from_rows, LogStore, Record, StoreError, COLUMNS};

/// In-process Log Store. Holds the header row plus appended rows.
pub struct MemoryStore {
    rows: Mutex<Vec<Vec<Value>>>,
    unavailable: AtomicBool,
    append_calls: AtomicUsize,
    read_calls: AtomicUsize,
    reset_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_header(COLUMNS.iter().map(|c| Value::from(*c)).collect())
    }

    /// A table with a custom header, e.g. the schema before `Muscle Group` existed.
    pub fn with_header(header: Vec<Value>) -> Self {
        Self {
            rows: Mutex::new(vec![header]),
            unavailable: AtomicBool::new(false),
            append_calls: AtomicUsize::new(0),
            read_calls: AtomicUsize::new(0),
            reset_calls: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<Value>>> {
        // A poisoned table is still a valid table; appends are whole-batch.
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Makes every subsequent call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Data rows only, header excluded.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.lock().iter().skip(1).cloned().collect()
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) -> usize {
        self.reset_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn append_rows(&self, rows: Vec<Vec<Value>>) -> Result<(), StoreError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.lock().extend(rows);
        Ok(())
    }

    async fn read_records(&self) -> Result<Vec<Record>, StoreError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(records_from_rows(self.lock().clone()))
    }

    fn reset(&self) {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_append_then_read() {
        let store = MemoryStore::new();
        store
            .append_rows(vec![
                vec![json!("2024-03-01"), json!("Squat"), json!(100), json!(5), json!(""), json!("Legs")],
                vec![json!("2024-03-01"), json!("Squat"), json!(110), json!(3), json!(""), json!("Legs")],
            ])
            .await
            .unwrap();

        let records = store.read_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["Weight"], json!(110));
        assert_eq!(records[0]["Muscle Group"], json!("Legs"));
        assert_eq!(store.append_calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_both_ways() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.append_rows(vec![vec![json!("x")]]).await.is_err());
        assert!(store.read_records().await.is_err());
        assert!(store.rows().is_empty());
    }
}
