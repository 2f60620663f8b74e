//! Telemetry reading model and record decoding.
//!
//! Stores return untyped records. [`decode_records`] turns a batch of them
//! into [`Reading`]s, skipping and counting the ones that do not decode.

use serde::{Deserialize, Serialize};

use crate::types::{RawRecord, UnixSeconds};

/// One timestamped telemetry sample from a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Opaque device identifier. Never empty.
    pub device_id: String,
    /// Seconds since the Unix epoch. Only used for ordering.
    pub timestamp: UnixSeconds,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
}

impl Reading {
    pub fn new(
        device_id: impl Into<String>,
        timestamp: UnixSeconds,
        temperature: f64,
        humidity: f64,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            temperature,
            humidity,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A single record that could not be decoded into a [`Reading`].
///
/// This is a soft failure: it is logged and counted, and the rest of the
/// batch is still processed.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("Record {index} could not be decoded: {reason}")]
pub struct RecordDecodeError {
    /// Position of the record in the batch returned by the store.
    pub index: usize,
    pub reason: String,
}

/// Result of decoding a batch of raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    /// Successfully decoded readings, in store order.
    pub readings: Vec<Reading>,
    pub decode_errors: Vec<RecordDecodeError>,
}

/// Decode one raw record.
///
/// Rejects records with a missing or mistyped field, an empty device id,
/// or a non-finite measurement.
pub fn decode_record(index: usize, raw: &RawRecord) -> Result<Reading, RecordDecodeError> {
    let fail = |reason: String| RecordDecodeError { index, reason };

    let reading = Reading::deserialize(raw).map_err(|e| fail(e.to_string()))?;

    if reading.device_id.trim().is_empty() {
        return Err(fail("device_id is empty".into()));
    }
    if !reading.temperature.is_finite() {
        return Err(fail(format!(
            "temperature is not finite: {}",
            reading.temperature
        )));
    }
    if !reading.humidity.is_finite() {
        return Err(fail(format!("humidity is not finite: {}", reading.humidity)));
    }

    Ok(reading)
}

/// Decode every record in `raw`, skipping the ones that fail.
pub fn decode_records(raw: &[RawRecord]) -> DecodedBatch {
    let mut batch = DecodedBatch {
        readings: Vec::with_capacity(raw.len()),
        decode_errors: Vec::new(),
    };

    for (index, record) in raw.iter().enumerate() {
        match decode_record(index, record) {
            Ok(reading) => batch.readings.push(reading),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed telemetry record");
                batch.decode_errors.push(e);
            }
        }
    }

    batch
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
