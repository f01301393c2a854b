use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::models::workout::LogTable;

/// Short-lived copy of the Log Store contents, shared by the reporter (reads)
/// and the recorder (invalidation after writes).
pub struct TableCache {
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<LogTable>)>>,
}

impl TableCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The cached table, if it is younger than the TTL.
    pub fn get(&self) -> Option<Arc<LogTable>> {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some((stored_at, table)) if stored_at.elapsed() < self.ttl => Some(table.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub fn put(&self, table: LogTable) -> Arc<LogTable> {
        let table = Arc::new(table);
        *self.lock() = Some((Instant::now(), table.clone()));
        table
    }

    pub fn invalidate(&self) {
        self.lock().take();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(Instant, Arc<LogTable>)>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}
