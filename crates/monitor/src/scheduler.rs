//! Periodic invocation loop.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use telewatch_core::request::InvocationRequest;
use telewatch_pipeline::{OutcomeKind, Pipeline};

/// Run `request` through `pipeline` every `period` until `cancel` fires.
///
/// The first invocation starts immediately. Invocations never overlap: a
/// run that outlasts the period delays the next tick instead of bunching.
/// Cancelling mid-invocation cancels that invocation too. Returns the
/// number of invocations started.
pub async fn run(
    pipeline: &Pipeline,
    request: &InvocationRequest,
    period: Duration,
    cancel: CancellationToken,
) -> usize {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut runs = 0usize;

    tracing::info!(period_secs = period.as_secs(), "Scheduler started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(runs, "Scheduler cancelled");
                break;
            }
            _ = interval.tick() => {
                runs += 1;
                let report = pipeline.run(request, &cancel).await;
                if report.is_fatal() {
                    tracing::error!(run = runs, "Invocation could not read the store");
                } else if report.count(OutcomeKind::DeliveryFailed) > 0 {
                    tracing::warn!(
                        run = runs,
                        failed = report.count(OutcomeKind::DeliveryFailed),
                        "Some alerts were not delivered"
                    );
                }
            }
        }
    }

    runs
}
