//! Fetch → decode → select → evaluate → format → dispatch.
//!
//! A [`Pipeline`] owns its collaborators and runs one invocation at a time
//! per call to [`Pipeline::run`]. Invocations share no mutable state, so
//! concurrent calls on the same pipeline are independent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use telewatch_core::alert::format_alert;
use telewatch_core::error::CoreError;
use telewatch_core::notify::{DispatchError, Notifier};
use telewatch_core::reading::{decode_records, Reading};
use telewatch_core::request::{EvaluationMode, InvocationRequest};
use telewatch_core::selector::{select_latest, select_latest_per_device};
use telewatch_core::source::{ReadingStore, SourceError};
use telewatch_core::thresholds::{evaluate, ThresholdConfig, ThresholdRule};

use crate::outcome::{InvocationReport, Outcome};

/// The threshold-alert pipeline.
pub struct Pipeline {
    store: Arc<dyn ReadingStore>,
    notifier: Arc<dyn Notifier>,
    rules: Vec<ThresholdRule>,
    timeout: Option<Duration>,
}

impl Pipeline {
    /// Build a pipeline. Fails if `thresholds` is inconsistent.
    pub fn new(
        store: Arc<dyn ReadingStore>,
        notifier: Arc<dyn Notifier>,
        thresholds: &ThresholdConfig,
    ) -> Result<Self, CoreError> {
        thresholds.validate()?;
        Ok(Self {
            store,
            notifier,
            rules: thresholds.rules(),
            timeout: None,
        })
    }

    /// Bound every invocation by `timeout`, measured from its start.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    /// Run one invocation to completion.
    ///
    /// Never panics and never returns an error: every failure is reported as
    /// an [`Outcome`]. Cancelling `cancel` (or passing the deadline) while the
    /// store is being read yields `SourceUnavailable`; during dispatch it
    /// yields `DeliveryFailed`.
    pub async fn run(
        &self,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> InvocationReport {
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "invocation",
            %invocation_id,
            device_id = request.device_id.as_deref().unwrap_or("*"),
            mode = ?request.mode,
        );

        let report = self
            .run_inner(invocation_id, request, cancel)
            .instrument(span.clone())
            .await;

        span.in_scope(|| {
            tracing::info!(
                outcome = %report.outcome().kind(),
                outcomes = report.outcomes().len(),
                decode_errors = report.decode_errors.len(),
                "Invocation finished"
            );
        });
        report
    }

    async fn run_inner(
        &self,
        invocation_id: Uuid,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> InvocationReport {
        // A timeout too large to represent as an instant means no deadline.
        let deadline = self.timeout.and_then(|t| Instant::now().checked_add(t));
        let mode = request.mode;

        tracing::debug!(store = %self.store.describe(), "Fetching readings");
        let fetched = match bounded(
            cancel,
            deadline,
            self.store.fetch_all(request.device_id.as_deref()),
        )
        .await
        {
            Some(result) => result,
            None => Err(SourceError::Cancelled),
        };

        let raw = match fetched {
            Ok(raw) => raw,
            Err(error) => {
                tracing::error!(error = %error, "Reading store fetch failed");
                return InvocationReport::new(
                    invocation_id,
                    mode,
                    Vec::new(),
                    Outcome::SourceUnavailable { error },
                    Vec::new(),
                );
            }
        };

        let batch = decode_records(&raw);
        tracing::debug!(
            records = raw.len(),
            readings = batch.readings.len(),
            "Decoded readings"
        );

        let selected: Vec<&Reading> = match mode {
            EvaluationMode::Latest => select_latest(&batch.readings).into_iter().collect(),
            EvaluationMode::PerDevice => select_latest_per_device(&batch.readings),
        };

        let mut outcomes = Vec::with_capacity(selected.len());
        for reading in selected {
            outcomes.push(self.check(reading, cancel, deadline).await);
        }

        let mut outcomes = outcomes.into_iter();
        let first = outcomes.next().unwrap_or_else(|| {
            tracing::info!("No usable readings");
            Outcome::EmptyDataset
        });
        InvocationReport::new(
            invocation_id,
            mode,
            batch.decode_errors,
            first,
            outcomes.collect(),
        )
    }

    /// Evaluate one reading and dispatch an alert if it violates a rule.
    async fn check(
        &self,
        reading: &Reading,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Outcome {
        let Some(violation) = evaluate(reading, &self.rules) else {
            tracing::info!(
                device_id = %reading.device_id,
                timestamp = reading.timestamp,
                "Reading within thresholds"
            );
            return Outcome::NoViolation {
                reading: reading.clone(),
            };
        };

        tracing::warn!(
            device_id = %reading.device_id,
            timestamp = reading.timestamp,
            metric = violation.rule.metric.label(),
            observed = violation.observed(),
            limit = violation.rule.limit,
            "Threshold violated"
        );

        let payload = format_alert(&violation);
        let sent = bounded(cancel, deadline, self.notifier.send(&payload))
            .await
            .unwrap_or(Err(DispatchError::Cancelled));

        match sent {
            Ok(()) => Outcome::AlertDelivered { violation },
            Err(error) => {
                tracing::error!(
                    device_id = %reading.device_id,
                    error = %error,
                    "Alert delivery failed"
                );
                Outcome::DeliveryFailed { violation, error }
            }
        }
    }
}

/// Drive `fut` until it completes, `cancel` fires, or `deadline` passes.
///
/// Returns `None` if the future was abandoned.
async fn bounded<F: Future>(
    cancel: &CancellationToken,
    deadline: Option<Instant>,
    fut: F,
) -> Option<F::Output> {
    let expired = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!("Invocation cancelled");
            None
        }
        _ = expired => {
            tracing::warn!("Invocation deadline exceeded");
            None
        }
        output = fut => Some(output),
    }
}
