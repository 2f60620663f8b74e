//! Builds a [`Pipeline`] from a validated [`MonitorConfig`].

use std::sync::Arc;

use telewatch_core::source::ReadingStore;
use telewatch_db::{DynamoReadingStore, FileReadingStore};
use telewatch_events::WebhookNotifier;
use telewatch_pipeline::Pipeline;

use crate::config::{MonitorConfig, StoreBackend};

/// Error type for pipeline construction.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Webhook(#[from] telewatch_events::WebhookError),

    #[error(transparent)]
    Core(#[from] telewatch_core::CoreError),
}

/// Create the reading store selected by `backend`.
pub async fn build_store(backend: &StoreBackend) -> Arc<dyn ReadingStore> {
    match backend {
        StoreBackend::Dynamo(table) => {
            Arc::new(DynamoReadingStore::from_env(table.clone()).await)
        }
        StoreBackend::File(path) => Arc::new(FileReadingStore::new(path.clone())),
    }
}

/// Wire store, webhook notifier and thresholds into a pipeline.
pub async fn build_pipeline(config: &MonitorConfig) -> Result<Pipeline, BuildError> {
    let store = build_store(&config.store).await;
    let notifier = Arc::new(WebhookNotifier::new(config.webhook.clone())?);

    tracing::info!(
        store = %store.describe(),
        webhook_host = config.webhook.url.host_str().unwrap_or("-"),
        "Pipeline configured"
    );

    let pipeline = Pipeline::new(store, notifier, &config.thresholds)?;
    Ok(pipeline.with_timeout(config.invocation_timeout))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn file_config(url: &str) -> MonitorConfig {
        MonitorConfig::from_lookup(|key| match key {
            "READINGS_FILE" => Some("/nonexistent/readings.json".into()),
            "DISCORD_WEBHOOK_URL" => Some(url.into()),
            "INVOCATION_TIMEOUT_SECS" => Some("5".into()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn builds_file_backed_pipeline() {
        let config = file_config("http://127.0.0.1:9/hook");
        let pipeline = build_pipeline(&config).await.unwrap();
        assert_eq!(pipeline.rules().len(), 4);
        assert_eq!(config.invocation_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn file_store_describes_its_path() {
        let store = build_store(&StoreBackend::File("/data/readings.json".into())).await;
        assert!(store.describe().contains("/data/readings.json"));
    }
}
