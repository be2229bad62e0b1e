//! Dispatcher - the resident loop turning incident requests into decisions
//!
//! Receives accepted incidents from a bounded channel, takes a roster
//! snapshot through the provider port, runs the matcher, records metrics,
//! and writes one decision line. Incidents are processed serially so the
//! output order matches the input order.

use crate::domain::types::IncidentRequest;
use crate::infra::metrics::Metrics;
use crate::io::report::DecisionWriter;
use crate::io::roster::RosterProvider;
use crate::services::matcher::Matcher;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

pub struct Dispatcher<W: Write> {
    matcher: Matcher,
    roster: Arc<dyn RosterProvider>,
    metrics: Arc<Metrics>,
    writer: DecisionWriter<W>,
}

impl<W: Write> Dispatcher<W> {
    pub fn new(
        matcher: Matcher,
        roster: Arc<dyn RosterProvider>,
        metrics: Arc<Metrics>,
        writer: DecisionWriter<W>,
    ) -> Self {
        Self { matcher, roster, metrics, writer }
    }

    /// Consume incident requests until the channel closes or shutdown fires
    ///
    /// An in-flight incident always completes before the loop exits.
    pub async fn run(
        &mut self,
        mut incident_rx: mpsc::Receiver<IncidentRequest>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                request = incident_rx.recv() => {
                    match request {
                        Some(request) => {
                            if let Err(e) = self.dispatch(request).await {
                                error!(error = %e, "decision_write_failed");
                                break;
                            }
                        }
                        None => break, // Channel closed (stdin EOF)
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }

    /// Match one incident against a fresh roster snapshot
    async fn dispatch(&mut self, request: IncidentRequest) -> std::io::Result<()> {
        let units = match self.roster.snapshot().await {
            Ok(units) => units,
            Err(e) => {
                error!(request_id = %request.request_id, error = %e, "roster_snapshot_failed");
                self.metrics.record_roster_error();
                // The caller still expects one line per incident
                self.writer.write_decision(None)?;
                let latency_us = request.received_at.elapsed().as_micros() as u64;
                self.metrics.record_no_match();
                self.metrics.record_incident_processed(latency_us);
                return Ok(());
            }
        };
        self.metrics.set_roster_size(units.len() as u64);

        let decision = self.matcher.select(&request.incident, &units);
        match &decision {
            Some(m) => {
                info!(
                    request_id = %request.request_id,
                    unit = %m.unit_id,
                    distance_km = format!("{:.3}", m.distance_km),
                    score = format!("{:.3}", m.score),
                    severity = %request.incident.severity,
                    "match_selected"
                );
                self.metrics.record_matched((m.distance_km * 1000.0) as u64);
                self.metrics.record_assignment(m.unit_id.as_str());
            }
            None => {
                info!(
                    request_id = %request.request_id,
                    roster_size = %units.len(),
                    "no_match"
                );
                self.metrics.record_no_match();
            }
        }
        self.writer.write_decision(decision.as_ref())?;

        let latency_us = request.received_at.elapsed().as_micros() as u64;
        self.metrics.record_incident_processed(latency_us);
        Ok(())
    }
}
