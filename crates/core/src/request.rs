//! Typed invocation requests.
//!
//! Triggers (schedules, on-demand calls) describe what to check with an
//! [`InvocationRequest`]. Requests are validated before reaching the
//! pipeline.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

/// How readings are reduced before threshold evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Evaluate the single newest reading across all devices.
    #[default]
    Latest,
    /// Evaluate the newest reading of each device independently.
    PerDevice,
}

impl std::str::FromStr for EvaluationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "latest" => Ok(EvaluationMode::Latest),
            "per_device" => Ok(EvaluationMode::PerDevice),
            other => Err(CoreError::Validation(format!(
                "Unknown evaluation mode '{other}'. Must be one of: latest, per_device"
            ))),
        }
    }
}

/// Input to one pipeline invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct InvocationRequest {
    /// Restrict the check to one device.
    #[serde(default)]
    #[validate(length(min = 1, max = 256))]
    pub device_id: Option<String>,
    #[serde(default)]
    pub mode: EvaluationMode,
}

impl InvocationRequest {
    /// Check every reading of every device, newest reading only.
    pub fn all_devices() -> Self {
        Self::default()
    }

    pub fn for_device(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            mode: EvaluationMode::Latest,
        }
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Parse and validate a JSON trigger event.
    pub fn from_json(event: &str) -> Result<Self, CoreError> {
        let request: Self = serde_json::from_str(event)
            .map_err(|e| CoreError::Validation(format!("Malformed invocation request: {e}")))?;
        request.check()?;
        Ok(request)
    }

    /// Run field validation; blank device ids are rejected as well.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;
        if matches!(&self.device_id, Some(id) if id.trim().is_empty()) {
            return Err(CoreError::Validation("device_id must not be blank".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_event_means_all_devices_latest() {
        let request = InvocationRequest::from_json("{}").unwrap();
        assert_eq!(request, InvocationRequest::all_devices());
        assert_eq!(request.mode, EvaluationMode::Latest);
    }

    #[test]
    fn parses_device_filter_and_mode() {
        let request =
            InvocationRequest::from_json(r#"{"device_id":"279","mode":"per_device"}"#).unwrap();
        assert_eq!(request.device_id.as_deref(), Some("279"));
        assert_eq!(request.mode, EvaluationMode::PerDevice);
    }

    #[test]
    fn rejects_empty_device_id() {
        assert!(InvocationRequest::from_json(r#"{"device_id":""}"#).is_err());
        assert!(InvocationRequest::from_json(r#"{"device_id":"   "}"#).is_err());
    }

    #[test]
    fn rejects_wrongly_typed_fields() {
        assert!(InvocationRequest::from_json(r#"{"device_id":279}"#).is_err());
        assert!(InvocationRequest::from_json(r#"{"mode":"sometimes"}"#).is_err());
    }

    #[test]
    fn mode_from_str() {
        assert_eq!(
            "per_device".parse::<EvaluationMode>().unwrap(),
            EvaluationMode::PerDevice
        );
        assert_eq!(
            " latest ".parse::<EvaluationMode>().unwrap(),
            EvaluationMode::Latest
        );
        assert!("weekly".parse::<EvaluationMode>().is_err());
    }
}
