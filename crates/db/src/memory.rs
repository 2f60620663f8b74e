//! In-memory reading store for tests and local dry runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use telewatch_core::reading::Reading;
use telewatch_core::source::{ReadingStore, SourceError};
use telewatch_core::types::RawRecord;

/// Holds raw records in memory.
///
/// Filtered fetches mimic a DynamoDB `Query`: only records whose
/// `device_id` matches are returned, newest first. Records without a
/// numeric timestamp sort last.
#[derive(Debug, Default)]
pub struct MemoryReadingStore {
    records: Mutex<Vec<RawRecord>>,
    failure: Option<String>,
    fetches: AtomicUsize,
}

impl MemoryReadingStore {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Build a store from already-typed readings.
    pub fn from_readings(readings: &[Reading]) -> Self {
        let records = readings
            .iter()
            .map(|r| serde_json::to_value(r).unwrap_or(Value::Null))
            .collect();
        Self::new(records)
    }

    /// A store whose every fetch fails with [`SourceError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn push(&self, record: RawRecord) {
        self.lock().push(record);
    }

    /// Number of `fetch_all` calls made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RawRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn fetch_all(&self, device_id: Option<&str>) -> Result<Vec<RawRecord>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(SourceError::Unavailable(reason.clone()));
        }

        let records = self.lock();
        let Some(device_id) = device_id else {
            return Ok(records.clone());
        };

        let mut matching: Vec<RawRecord> = records
            .iter()
            .filter(|r| r.get("device_id").and_then(Value::as_str) == Some(device_id))
            .cloned()
            .collect();
        matching.sort_by_key(|r| std::cmp::Reverse(r.get("timestamp").and_then(Value::as_i64)));
        Ok(matching)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
