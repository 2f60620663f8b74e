//! Reading store abstraction.
//!
//! A [`ReadingStore`] returns raw records; the pipeline decodes them with
//! [`decode_records`](crate::reading::decode_records). Transport failures
//! are fatal to an invocation, per-record decode failures are not.

use async_trait::async_trait;

use crate::types::RawRecord;

/// Error type for reading store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The store could not be reached or returned a protocol error.
    #[error("Reading store unavailable: {0}")]
    Unavailable(String),

    /// The fetch was abandoned because the invocation was cancelled or its
    /// deadline passed.
    #[error("Reading store fetch cancelled")]
    Cancelled,
}

/// Source of raw telemetry records.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Fetch every current record, or only the records for `device_id`.
    ///
    /// Filtered fetches return the newest record first when the backing
    /// store can order by timestamp. Unfiltered fetches have no defined order.
    async fn fetch_all(&self, device_id: Option<&str>) -> Result<Vec<RawRecord>, SourceError>;

    /// Human-readable description of the store, used in logs.
    fn describe(&self) -> String;
}
