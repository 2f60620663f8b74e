//! Webhook delivery of telemetry alerts.
//!
//! [`WebhookNotifier`] sends an [`AlertPayload`] to a Discord-style webhook
//! via HTTP POST. Exactly one attempt is made per call; the only response
//! counted as delivered is the configured "accepted" status (204 No Content
//! by default).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use telewatch_core::alert::AlertPayload;
use telewatch_core::notify::{DispatchError, Notifier};

/// Status a Discord webhook answers with when it accepts a message.
pub const DEFAULT_ACCEPTED_STATUS: u16 = 204;

/// Default HTTP request timeout for a single delivery attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Embed side-bar colour (amber).
const EMBED_COLOR: u32 = 0xFF_A5_00;

/// Longest response body kept in a [`DispatchError::Rejected`].
const MAX_ERROR_BODY_CHARS: usize = 1024;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for building a webhook notifier.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The HTTP client could not be constructed (TLS backend, etc.).
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The webhook URL is not an http(s) URL.
    #[error("Webhook URL must use http or https, got '{0}'")]
    Scheme(String),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// JSON shape posted to the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WebhookFormat {
    /// `{"embeds": [{title, description, color, fields}]}`.
    #[default]
    Embed,
    /// `{"content": "..."}` plain text.
    Text,
}

impl std::str::FromStr for WebhookFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "embed" => Ok(WebhookFormat::Embed),
            "text" => Ok(WebhookFormat::Text),
            other => Err(format!(
                "Unknown webhook format '{other}'. Must be one of: embed, text"
            )),
        }
    }
}

/// Settings for [`WebhookNotifier`].
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: Url,
    pub format: WebhookFormat,
    pub accepted_status: u16,
    pub timeout: Duration,
}

impl WebhookConfig {
    /// Embed format, 204 accepted, 10 s timeout.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            format: WebhookFormat::default(),
            accepted_status: DEFAULT_ACCEPTED_STATUS,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Render the request body for `payload` in the given format.
pub fn render_body(payload: &AlertPayload, format: WebhookFormat) -> serde_json::Value {
    match format {
        WebhookFormat::Embed => {
            let fields: Vec<serde_json::Value> = payload
                .fields
                .iter()
                .map(|f| json!({ "name": f.name, "value": f.value, "inline": true }))
                .collect();
            json!({
                "embeds": [{
                    "title": payload.title,
                    "description": payload.description,
                    "color": EMBED_COLOR,
                    "fields": fields,
                }]
            })
        }
        WebhookFormat::Text => json!({ "content": payload.to_text() }),
    }
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// Delivers alerts to a webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    /// Create a notifier with a pre-configured HTTP client.
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        if !matches!(config.url.scheme(), "http" | "https") {
            return Err(WebhookError::Scheme(config.url.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, body: &serde_json::Value) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(self.config.url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| DispatchError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        if status == self.config.accepted_status {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DispatchError::Rejected {
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, payload: &AlertPayload) -> Result<(), DispatchError> {
        let body = render_body(payload, self.config.format);
        tracing::debug!(title = %payload.title, "Posting alert to webhook");

        match self.try_send(&body).await {
            Ok(()) => {
                tracing::info!(title = %payload.title, "Alert delivered to webhook");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    status = e.status_code(),
                    error = %e,
                    "Webhook delivery failed"
                );
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use telewatch_core::alert::AlertField;

    use super::*;

    fn sample_payload() -> AlertPayload {
        AlertPayload {
            title: "WARNING: Temperature below minimum".into(),
            description: "Temperature on device dev1 is 5.00°C.".into(),
            fields: vec![
                AlertField {
                    name: "Device".into(),
                    value: "dev1".into(),
                },
                AlertField {
                    name: "Temperature".into(),
                    value: "5.00°C".into(),
                },
            ],
            timestamp: 200,
        }
    }

    #[test]
    fn embed_body_carries_title_description_and_ordered_fields() {
        let body = render_body(&sample_payload(), WebhookFormat::Embed);
        let embed = &body["embeds"][0];
        assert_eq!(embed["title"], "WARNING: Temperature below minimum");
        assert_eq!(embed["description"], "Temperature on device dev1 is 5.00°C.");
        assert_eq!(embed["color"], EMBED_COLOR);
        assert_eq!(embed["fields"][0]["name"], "Device");
        assert_eq!(embed["fields"][1]["value"], "5.00°C");
        assert_eq!(embed["fields"][1]["inline"], true);
    }

    #[test]
    fn text_body_is_a_single_content_string() {
        let body = render_body(&sample_payload(), WebhookFormat::Text);
        let content = body["content"].as_str().unwrap();
        assert_eq!(content, "Device: dev1\nTemperature: 5.00°C");
        assert_eq!(body.as_object().unwrap().len(), 1);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("embed".parse::<WebhookFormat>(), Ok(WebhookFormat::Embed));
        assert_eq!("text".parse::<WebhookFormat>(), Ok(WebhookFormat::Text));
        assert!("markdown".parse::<WebhookFormat>().is_err());
    }

    #[test]
    fn rejects_non_http_scheme() {
        let config = WebhookConfig::new(Url::parse("ftp://example.com/hook").unwrap());
        let err = WebhookNotifier::new(config).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn new_uses_discord_defaults() {
        let config = WebhookConfig::new(Url::parse("https://example.com/hook").unwrap());
        let notifier = WebhookNotifier::new(config).unwrap();
        assert_eq!(notifier.config().accepted_status, 204);
        assert_eq!(notifier.config().format, WebhookFormat::Embed);
    }
}
