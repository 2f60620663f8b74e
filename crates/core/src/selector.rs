//! Latest-reading selection.
//!
//! A timestamp of `0` is the "nothing seen yet" sentinel: readings must be
//! strictly newer than it to be selected, so a reading stamped exactly at
//! the epoch (or earlier) is never chosen. Ties keep the first reading in
//! iteration order, which is only as deterministic as the store's ordering.

use std::collections::HashMap;

use crate::reading::Reading;
use crate::types::UnixSeconds;

/// Timestamp value meaning "no valid timestamp seen".
pub const NO_TIMESTAMP: UnixSeconds = 0;

/// Return the reading with the greatest timestamp, or `None` when the input
/// is empty or no reading is newer than [`NO_TIMESTAMP`].
pub fn select_latest(readings: &[Reading]) -> Option<&Reading> {
    let mut latest: Option<&Reading> = None;
    let mut max_timestamp = NO_TIMESTAMP;

    for reading in readings {
        if reading.timestamp > max_timestamp {
            max_timestamp = reading.timestamp;
            latest = Some(reading);
        }
    }

    latest
}

/// Select the latest reading for each device.
///
/// Devices are returned in the order their first reading appears. Devices
/// with no reading newer than [`NO_TIMESTAMP`] are omitted.
pub fn select_latest_per_device(readings: &[Reading]) -> Vec<&Reading> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<&Reading> = Vec::new();

    for reading in readings {
        if reading.timestamp <= NO_TIMESTAMP {
            continue;
        }
        match slots.get(reading.device_id.as_str()) {
            Some(&slot) => {
                if reading.timestamp > latest[slot].timestamp {
                    latest[slot] = reading;
                }
            }
            None => {
                slots.insert(reading.device_id.as_str(), latest.len());
                latest.push(reading);
            }
        }
    }

    latest
}
