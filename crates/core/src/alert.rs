//! Alert payloads rendered from threshold violations.

use chrono::{DateTime, SecondsFormat};
use serde::Serialize;

use crate::thresholds::{Bound, Violation};
use crate::types::UnixSeconds;

/// Field label for the device identifier.
pub const FIELD_DEVICE: &str = "Device";
/// Field label for the reading timestamp.
pub const FIELD_TIMESTAMP: &str = "Timestamp";
/// Field label for the temperature value.
pub const FIELD_TEMPERATURE: &str = "Temperature";
/// Field label for the humidity value.
pub const FIELD_HUMIDITY: &str = "Humidity";

/// One labelled value in an alert's field table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertField {
    pub name: String,
    pub value: String,
}

/// Notification content for a single violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertPayload {
    pub title: String,
    pub description: String,
    /// Ordered: device, timestamp, temperature, humidity.
    pub fields: Vec<AlertField>,
    /// Raw reading timestamp, as shown in the plain-text layout.
    pub timestamp: UnixSeconds,
}

impl AlertPayload {
    /// Look up a field value by label.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Plain-text rendering: one `Label: value` line per field, with the
    /// timestamp as raw seconds.
    ///
    /// ```text
    /// Device: dev1
    /// Timestamp: 200
    /// Temperature: 5.00°C
    /// Humidity: 55.00%
    /// ```
    pub fn to_text(&self) -> String {
        self.fields
            .iter()
            .map(|field| match field.name.as_str() {
                FIELD_TIMESTAMP => format!("{}: {}", field.name, self.timestamp),
                _ => format!("{}: {}", field.name, field.value),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render a violation into an alert payload.
///
/// Deterministic: the same violation always produces the same payload.
pub fn format_alert(violation: &Violation) -> AlertPayload {
    let rule = &violation.rule;
    let reading = &violation.reading;
    let metric = rule.metric;
    let unit = metric.unit();

    let (direction, bound_name) = match rule.bound {
        Bound::Min => ("below", "minimum"),
        Bound::Max => ("above", "maximum"),
    };

    let title = format!("WARNING: {} {direction} {bound_name}", metric.label());

    let description = format!(
        "{} on device {} is {:.2}{unit}, {:.2}{unit} {direction} the configured {bound_name} of {:.2}{unit}.",
        metric.label(),
        reading.device_id,
        violation.observed(),
        violation.margin(),
        rule.limit,
    );

    let fields = vec![
        field(FIELD_DEVICE, reading.device_id.clone()),
        field(FIELD_TIMESTAMP, format_timestamp(reading.timestamp)),
        field(FIELD_TEMPERATURE, format!("{:.2}°C", reading.temperature)),
        field(FIELD_HUMIDITY, format!("{:.2}%", reading.humidity)),
    ];

    AlertPayload {
        title,
        description,
        fields,
        timestamp: reading.timestamp,
    }
}

fn field(name: &str, value: String) -> AlertField {
    AlertField {
        name: name.to_string(),
        value,
    }
}

/// Raw seconds, with the UTC date appended when it is representable.
fn format_timestamp(timestamp: UnixSeconds) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => format!(
            "{timestamp} ({})",
            dt.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        None => timestamp.to_string(),
    }
}
