//! DynamoDB-backed reading store.
//!
//! Unfiltered fetches run a paginated `Scan` over the whole table. Filtered
//! fetches `Query` the `device_id` partition key with
//! `ScanIndexForward = false`, so the newest reading comes back first.
//! Items are converted to JSON objects and decoded by the pipeline.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::{Map, Number, Value};

use telewatch_core::source::{ReadingStore, SourceError};
use telewatch_core::types::RawRecord;

/// Partition key attribute of the readings table.
pub const DEVICE_ID_ATTRIBUTE: &str = "device_id";

type Item = HashMap<String, AttributeValue>;

/// Reads telemetry items from a DynamoDB table.
#[derive(Debug, Clone)]
pub struct DynamoReadingStore {
    client: Client,
    table_name: String,
}

impl DynamoReadingStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Build a client from the default AWS credential and region chain.
    pub async fn from_env(table_name: impl Into<String>) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&sdk_config), table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn scan_all(&self) -> Result<Vec<Item>, SourceError> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| unavailable("scan", &self.table_name, DisplayErrorContext(e)))?;

            items.extend(output.items().iter().cloned());

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn query_device(&self, device_id: &str) -> Result<Vec<Item>, SourceError> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#device = :device")
                .expression_attribute_names("#device", DEVICE_ID_ATTRIBUTE)
                .expression_attribute_values(":device", AttributeValue::S(device_id.to_string()))
                .scan_index_forward(false)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| unavailable("query", &self.table_name, DisplayErrorContext(e)))?;

            items.extend(output.items().iter().cloned());

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl ReadingStore for DynamoReadingStore {
    async fn fetch_all(&self, device_id: Option<&str>) -> Result<Vec<RawRecord>, SourceError> {
        let items = match device_id {
            Some(id) => self.query_device(id).await?,
            None => self.scan_all().await?,
        };

        tracing::debug!(
            table = %self.table_name,
            device_id = device_id.unwrap_or("*"),
            count = items.len(),
            "Fetched telemetry items from DynamoDB"
        );

        Ok(items.iter().map(item_to_json).collect())
    }

    fn describe(&self) -> String {
        format!("dynamodb://{}", self.table_name)
    }
}

fn unavailable(operation: &str, table: &str, err: impl std::fmt::Display) -> SourceError {
    tracing::error!(operation, table, error = %err, "DynamoDB request failed");
    SourceError::Unavailable(format!("DynamoDB {operation} on '{table}' failed: {err}"))
}

// ---------------------------------------------------------------------------
// Attribute conversion
// ---------------------------------------------------------------------------

/// Convert a DynamoDB item into a JSON object.
pub fn item_to_json(item: &Item) -> RawRecord {
    let object: Map<String, Value> = item
        .iter()
        .map(|(name, value)| (name.clone(), attribute_to_json(value)))
        .collect();
    Value::Object(object)
}

/// Convert one attribute value.
///
/// Numbers become integers when they parse as `i64` and floats otherwise.
/// Binary attributes and number strings that do not parse map to `null`,
/// which the reading decoder then rejects if the field was required.
pub fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::M(map) => item_to_json(map),
        AttributeValue::L(list) => Value::Array(list.iter().map(attribute_to_json).collect()),
        AttributeValue::Ss(set) => Value::Array(set.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(set) => Value::Array(set.iter().map(|n| number_to_json(n)).collect()),
        _ => Value::Null,
    }
}

fn number_to_json(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use telewatch_core::reading::decode_record;

    use super::*;

    fn telemetry_item(device: &str, ts: &str, temp: &str, humidity: &str) -> Item {
        HashMap::from([
            ("device_id".to_string(), AttributeValue::S(device.into())),
            ("timestamp".to_string(), AttributeValue::N(ts.into())),
            ("temperature".to_string(), AttributeValue::N(temp.into())),
            ("humidity".to_string(), AttributeValue::N(humidity.into())),
        ])
    }

    #[test]
    fn converts_telemetry_item_to_json() {
        let json = item_to_json(&telemetry_item("279", "1700000000", "21.37", "48"));
        assert_eq!(
            json,
            json!({
                "device_id": "279",
                "timestamp": 1_700_000_000,
                "temperature": 21.37,
                "humidity": 48,
            })
        );
    }

    #[test]
    fn converted_item_decodes_into_reading() {
        let json = item_to_json(&telemetry_item("279", "1700000000", "21.37", "48"));
        let reading = decode_record(0, &json).unwrap();
        assert_eq!(reading.device_id, "279");
        assert_eq!(reading.timestamp, 1_700_000_000);
        assert_eq!(reading.humidity, 48.0);
    }

    #[test]
    fn fractional_timestamp_fails_to_decode() {
        let json = item_to_json(&telemetry_item("279", "1700000000.5", "21", "48"));
        assert!(decode_record(0, &json).is_err());
    }

    #[test]
    fn unparseable_number_becomes_null() {
        assert_eq!(attribute_to_json(&AttributeValue::N("abc".into())), Value::Null);
        assert_eq!(attribute_to_json(&AttributeValue::N("NaN".into())), Value::Null);
    }

    #[test]
    fn nested_maps_and_lists_convert_recursively() {
        let value = AttributeValue::M(HashMap::from([(
            "samples".to_string(),
            AttributeValue::L(vec![
                AttributeValue::N("1".into()),
                AttributeValue::Bool(true),
                AttributeValue::Null(true),
            ]),
        )]));
        assert_eq!(
            attribute_to_json(&value),
            json!({ "samples": [1, true, null] })
        );
    }

    #[test]
    fn string_sets_become_arrays() {
        let value = AttributeValue::Ss(vec!["a".into(), "b".into()]);
        assert_eq!(attribute_to_json(&value), json!(["a", "b"]));
    }
}
