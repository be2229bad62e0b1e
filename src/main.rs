//! Crisis dispatch - incident-to-unit matching service
//!
//! Resident worker: reads incident lines from stdin, matches each against
//! the configured unit roster, and writes one decision line to stdout.
//!
//! Module structure:
//! - `domain/` - Core types (GeoPoint, Incident, Unit, UnitMatch)
//! - `io/` - External interfaces (ingest, roster, report, Prometheus)
//! - `services/` - Matching logic (Matcher, scoring policies, Dispatcher)
//! - `infra/` - Infrastructure (Config, Metrics)

use anyhow::Context;
use clap::Parser;
use crisis_dispatch::domain::types::IncidentRequest;
use crisis_dispatch::infra::{Config, Metrics};
use crisis_dispatch::io::{DecisionWriter, StaticRoster};
use crisis_dispatch::services::{policy_by_name, Dispatcher, Matcher};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Crisis dispatch - nearest-unit matching for incident reports
#[derive(Parser, Debug)]
#[command(name = "crisis-dispatch", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full visibility.
    // Logs go to stderr; stdout carries only decision lines.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        "crisis-dispatch starting"
    );

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        service_id = %config.service_id(),
        roster_units = %config.units().len(),
        matching_policy = %config.matching_policy(),
        metrics_interval_secs = %config.metrics_interval_secs(),
        prometheus_port = %config.prometheus_port(),
        "config_loaded"
    );

    // Invalid roster or policy is a startup failure, not a runtime skip
    let roster = Arc::new(
        StaticRoster::from_config(&config).context("Invalid roster configuration")?,
    );
    let policy = policy_by_name(config.matching_policy())
        .with_context(|| format!("Unknown scoring policy {:?}", config.matching_policy()))?;
    let matcher = Matcher::with_policy(policy);

    let metrics = Arc::new(Metrics::new());

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start Prometheus metrics HTTP server (if port > 0)
    let prometheus_port = config.prometheus_port();
    if prometheus_port > 0 {
        let prom_metrics = metrics.clone();
        let prom_service_id = config.service_id().to_string();
        let prom_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = crisis_dispatch::io::prometheus::start_metrics_server(
                prometheus_port,
                prom_metrics,
                prom_service_id,
                prom_shutdown,
            )
            .await
            {
                tracing::error!(error = %e, "Prometheus metrics server error");
            }
        });
    }

    // Start metrics reporter (lock-free reads with full summary)
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            let summary = metrics_clone.report();
            summary.log();
        }
    });

    // Create incident channel (bounded for backpressure)
    let (incident_tx, incident_rx) = mpsc::channel(1000);

    // Stdin reader: parse incident lines, warn-and-skip on malformed input.
    // Dropping the sender on EOF ends the dispatcher loop.
    let reader_metrics = metrics.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match crisis_dispatch::io::parse_line(&line) {
                        Ok(incident) => {
                            if incident_tx.send(IncidentRequest::new(incident)).await.is_err() {
                                break; // Dispatcher gone
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, line = %line, "malformed_incident_line");
                            reader_metrics.record_malformed();
                        }
                    }
                }
                Ok(None) => {
                    info!("stdin_eof");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "stdin_read_error");
                    break;
                }
            }
        }
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Run dispatcher - consumes incidents until stdin closes or shutdown
    let mut dispatcher =
        Dispatcher::new(matcher, roster, metrics.clone(), DecisionWriter::new(std::io::stdout()));
    info!("dispatcher_started");
    dispatcher.run(incident_rx, shutdown_rx).await;

    // Final summary before exit
    metrics.report().log();
    info!("crisis-dispatch shutdown complete");
    Ok(())
}
