//! `telewatch-monitor` -- telemetry threshold alerting daemon.
//!
//! Reads telemetry from a DynamoDB table (or a JSON file), checks the latest
//! reading against temperature and humidity bounds, and posts an alert to a
//! Discord-style webhook when a bound is crossed.
//!
//! With `POLL_INTERVAL_SECS` set it runs on a schedule until SIGINT/SIGTERM.
//! Otherwise it runs a single invocation, prints the report as JSON and
//! exits non-zero only if the store could not be read. A JSON trigger event
//! such as `{"device_id":"279","mode":"per_device"}` may be passed as the
//! first argument to override `DEVICE_ID` / `EVALUATION_MODE`.
//!
//! See [`MonitorConfig::from_env`] for the environment variables.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telewatch_core::request::InvocationRequest;
use telewatch_monitor::config::{LogFormat, MonitorConfig};
use telewatch_monitor::{app, scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = MonitorConfig::from_env();
    init_tracing(
        config
            .as_ref()
            .map(|c| c.log_format)
            .unwrap_or_default(),
    );
    let config = config.context("Invalid monitor configuration")?;

    let request = match std::env::args().nth(1) {
        Some(event) => InvocationRequest::from_json(&event).context("Invalid trigger event")?,
        None => config.request.clone(),
    };

    tracing::info!(
        device_id = request.device_id.as_deref().unwrap_or("*"),
        mode = ?request.mode,
        poll_interval_secs = config.poll_interval.map(|p| p.as_secs()),
        "Starting telewatch-monitor",
    );

    let pipeline = app::build_pipeline(&config)
        .await
        .context("Failed to build pipeline")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    if let Some(period) = config.poll_interval {
        let runs = scheduler::run(&pipeline, &request, period, cancel).await;
        tracing::info!(runs, "telewatch-monitor stopped");
        return Ok(());
    }

    let report = pipeline.run(&request, &cancel).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );

    if report.is_fatal() {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "telewatch_monitor=info,telewatch_pipeline=info,telewatch_events=info,\
         telewatch_db=info,telewatch_core=info"
            .into()
    });

    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
