//! JSON file reading store.
//!
//! Reads a file holding a JSON array of telemetry records. Useful for
//! replaying exported table contents without AWS access.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use telewatch_core::source::{ReadingStore, SourceError};
use telewatch_core::types::RawRecord;

#[derive(Debug, Clone)]
pub struct FileReadingStore {
    path: PathBuf,
}

impl FileReadingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReadingStore for FileReadingStore {
    async fn fetch_all(&self, device_id: Option<&str>) -> Result<Vec<RawRecord>, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SourceError::Unavailable(format!("Failed to read {}: {e}", self.path.display()))
        })?;

        // A file that is not a JSON array is a protocol error, not a bad record.
        let records: Vec<RawRecord> = serde_json::from_str(&contents).map_err(|e| {
            SourceError::Unavailable(format!(
                "{} is not a JSON array of records: {e}",
                self.path.display()
            ))
        })?;

        Ok(match device_id {
            Some(id) => records
                .into_iter()
                .filter(|r| r.get("device_id").and_then(Value::as_str) == Some(id))
                .collect(),
            None => records,
        })
    }

    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }
}
