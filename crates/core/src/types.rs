/// Reading timestamps are whole seconds since the Unix epoch.
///
/// Store adapters convert to this unit before records reach the core.
pub type UnixSeconds = i64;

/// A raw, undecoded record as returned by a reading store.
///
/// Stores hand back JSON objects; decoding into a
/// [`Reading`](crate::reading::Reading) happens record by record so one
/// malformed item never poisons the batch.
pub type RawRecord = serde_json::Value;
