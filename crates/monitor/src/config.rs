//! Monitor configuration loaded from environment variables.
//!
//! Everything the monitor needs is read and validated once, at startup,
//! into a [`MonitorConfig`]. Nothing downstream reads the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use telewatch_core::request::{EvaluationMode, InvocationRequest};
use telewatch_core::thresholds::{
    ThresholdConfig, DEFAULT_MAX_HUMIDITY, DEFAULT_MAX_TEMPERATURE, DEFAULT_MIN_HUMIDITY,
    DEFAULT_MIN_TEMPERATURE,
};
use telewatch_events::delivery::webhook::{
    WebhookConfig, WebhookFormat, DEFAULT_ACCEPTED_STATUS, DEFAULT_REQUEST_TIMEOUT,
};

/// Default deadline for one invocation.
pub const DEFAULT_INVOCATION_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// A variable is set but its value is unusable.
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where readings come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// DynamoDB table name.
    Dynamo(String),
    /// JSON array file, for replays and dry runs.
    File(PathBuf),
}

/// Log output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!(
                "Unknown log format '{other}'. Must be one of: pretty, json"
            )),
        }
    }
}

/// Validated monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub store: StoreBackend,
    pub webhook: WebhookConfig,
    pub thresholds: ThresholdConfig,
    pub request: InvocationRequest,
    /// Run on this period; `None` means run once and exit.
    pub poll_interval: Option<Duration>,
    pub invocation_timeout: Duration,
    pub log_format: LogFormat,
}

impl MonitorConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Required | Default  |
    /// |---------------------------|----------|----------|
    /// | `TABLE_NAME`              | yes¹     | --       |
    /// | `READINGS_FILE`           | no       | --       |
    /// | `DISCORD_WEBHOOK_URL`     | yes      | --       |
    /// | `WEBHOOK_FORMAT`          | no       | `embed`  |
    /// | `WEBHOOK_ACCEPTED_STATUS` | no       | `204`    |
    /// | `WEBHOOK_TIMEOUT_SECS`    | no       | `10`     |
    /// | `MIN_TEMPERATURE`         | no       | `10`     |
    /// | `MAX_TEMPERATURE`         | no       | `30`     |
    /// | `MIN_HUMIDITY`            | no       | `20`     |
    /// | `MAX_HUMIDITY`            | no       | `80`     |
    /// | `DEVICE_ID`               | no       | --       |
    /// | `EVALUATION_MODE`         | no       | `latest` |
    /// | `POLL_INTERVAL_SECS`      | no       | --       |
    /// | `INVOCATION_TIMEOUT_SECS` | no       | `30`     |
    /// | `LOG_FORMAT`              | no       | `pretty` |
    ///
    /// ¹ Not required when `READINGS_FILE` is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value. Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let store = match (get("READINGS_FILE"), get("TABLE_NAME")) {
            (Some(path), _) => StoreBackend::File(PathBuf::from(path)),
            (None, Some(table)) => StoreBackend::Dynamo(table),
            (None, None) => return Err(ConfigError::Missing("TABLE_NAME")),
        };

        let webhook = {
            let raw =
                get("DISCORD_WEBHOOK_URL").ok_or(ConfigError::Missing("DISCORD_WEBHOOK_URL"))?;
            let url = Url::parse(&raw).map_err(|e| invalid("DISCORD_WEBHOOK_URL", e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid(
                    "DISCORD_WEBHOOK_URL",
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
            WebhookConfig {
                url,
                format: parse_or("WEBHOOK_FORMAT", get("WEBHOOK_FORMAT"), WebhookFormat::Embed)?,
                accepted_status: parse_or(
                    "WEBHOOK_ACCEPTED_STATUS",
                    get("WEBHOOK_ACCEPTED_STATUS"),
                    DEFAULT_ACCEPTED_STATUS,
                )?,
                timeout: match get("WEBHOOK_TIMEOUT_SECS") {
                    Some(v) => positive_secs("WEBHOOK_TIMEOUT_SECS", &v)?,
                    None => DEFAULT_REQUEST_TIMEOUT,
                },
            }
        };
        if !(100..=599).contains(&webhook.accepted_status) {
            return Err(invalid(
                "WEBHOOK_ACCEPTED_STATUS",
                format!("{} is not an HTTP status", webhook.accepted_status),
            ));
        }

        let thresholds = ThresholdConfig {
            min_temperature: parse_or(
                "MIN_TEMPERATURE",
                get("MIN_TEMPERATURE"),
                DEFAULT_MIN_TEMPERATURE,
            )?,
            max_temperature: parse_or(
                "MAX_TEMPERATURE",
                get("MAX_TEMPERATURE"),
                DEFAULT_MAX_TEMPERATURE,
            )?,
            min_humidity: parse_or("MIN_HUMIDITY", get("MIN_HUMIDITY"), DEFAULT_MIN_HUMIDITY)?,
            max_humidity: parse_or("MAX_HUMIDITY", get("MAX_HUMIDITY"), DEFAULT_MAX_HUMIDITY)?,
        };
        thresholds.validate().map_err(|e| invalid("thresholds", e))?;

        let request = InvocationRequest {
            device_id: get("DEVICE_ID"),
            mode: parse_or("EVALUATION_MODE", get("EVALUATION_MODE"), EvaluationMode::Latest)?,
        };
        request.check().map_err(|e| invalid("DEVICE_ID", e))?;

        let poll_interval = get("POLL_INTERVAL_SECS")
            .map(|v| positive_secs("POLL_INTERVAL_SECS", &v))
            .transpose()?;

        let invocation_timeout = match get("INVOCATION_TIMEOUT_SECS") {
            Some(v) => positive_secs("INVOCATION_TIMEOUT_SECS", &v)?,
            None => DEFAULT_INVOCATION_TIMEOUT,
        };

        let log_format = parse_or("LOG_FORMAT", get("LOG_FORMAT"), LogFormat::Pretty)?;

        Ok(Self {
            store,
            webhook,
            thresholds,
            request,
            poll_interval,
            invocation_timeout,
            log_format,
        })
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse().map_err(|e| invalid(var, e)),
        None => Ok(default),
    }
}

fn positive_secs(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = value.parse().map_err(|e| invalid(var, e))?;
    if secs == 0 {
        return Err(invalid(var, "must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<MonitorConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MonitorConfig::from_lookup(|key| map.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("TABLE_NAME", "SensorData"),
        ("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/abc"),
    ];

    #[test]
    fn minimal_config_uses_defaults() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.store, StoreBackend::Dynamo("SensorData".into()));
        assert_eq!(config.webhook.format, WebhookFormat::Embed);
        assert_eq!(config.webhook.accepted_status, 204);
        assert_eq!(config.webhook.timeout, Duration::from_secs(10));
        assert_eq!(config.thresholds, ThresholdConfig::default());
        assert_eq!(config.request, InvocationRequest::all_devices());
        assert_eq!(config.poll_interval, None);
        assert_eq!(config.invocation_timeout, Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn missing_table_and_file_is_an_error() {
        let err = load(&[("DISCORD_WEBHOOK_URL", "https://example.com/hook")]).unwrap_err();
        assert_matches!(err, ConfigError::Missing("TABLE_NAME"));
    }

    #[test]
    fn readings_file_replaces_table() {
        let config = load(&[
            ("READINGS_FILE", "/tmp/readings.json"),
            ("DISCORD_WEBHOOK_URL", "https://example.com/hook"),
        ])
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::File(PathBuf::from("/tmp/readings.json"))
        );
    }

    #[test]
    fn missing_webhook_is_an_error() {
        let err = load(&[("TABLE_NAME", "SensorData")]).unwrap_err();
        assert_matches!(err, ConfigError::Missing("DISCORD_WEBHOOK_URL"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let err = load(&[("TABLE_NAME", "  "), ("DISCORD_WEBHOOK_URL", "https://x.io")])
            .unwrap_err();
        assert_matches!(err, ConfigError::Missing("TABLE_NAME"));
    }

    #[test]
    fn rejects_non_http_webhook() {
        let mut vars = MINIMAL.to_vec();
        vars[1] = ("DISCORD_WEBHOOK_URL", "ftp://example.com/hook");
        let err = load(&vars).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "DISCORD_WEBHOOK_URL", .. });
    }

    #[test]
    fn parses_overrides() {
        let mut vars = MINIMAL.to_vec();
        vars.extend([
            ("WEBHOOK_FORMAT", "text"),
            ("WEBHOOK_ACCEPTED_STATUS", "200"),
            ("MIN_TEMPERATURE", "-5.5"),
            ("MAX_HUMIDITY", "90"),
            ("DEVICE_ID", "279"),
            ("EVALUATION_MODE", "per_device"),
            ("POLL_INTERVAL_SECS", "300"),
            ("LOG_FORMAT", "json"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.webhook.format, WebhookFormat::Text);
        assert_eq!(config.webhook.accepted_status, 200);
        assert_eq!(config.thresholds.min_temperature, -5.5);
        assert_eq!(config.thresholds.max_humidity, 90.0);
        assert_eq!(config.request.device_id.as_deref(), Some("279"));
        assert_eq!(config.request.mode, EvaluationMode::PerDevice);
        assert_eq!(config.poll_interval, Some(Duration::from_secs(300)));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("MIN_HUMIDITY", "85"));
        let err = load(&vars).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "thresholds", .. });
    }

    #[test]
    fn rejects_unparseable_number() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("MAX_TEMPERATURE", "warm"));
        let err = load(&vars).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "MAX_TEMPERATURE", .. });
    }

    #[test]
    fn rejects_zero_interval() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("POLL_INTERVAL_SECS", "0"));
        let err = load(&vars).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "POLL_INTERVAL_SECS", .. });
    }

    #[test]
    fn rejects_unknown_mode() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("EVALUATION_MODE", "hourly"));
        assert!(load(&vars).is_err());
    }
}
