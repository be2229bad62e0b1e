//! Prometheus metrics HTTP endpoint
//!
//! Exposes dispatch metrics in Prometheus text format at /metrics.
//! Uses hyper for the HTTP server.

use crate::infra::metrics::{
    Metrics, MetricsSummary, METRICS_BUCKET_BOUNDS, METRICS_MATCH_DIST_BOUNDS, METRICS_NUM_BUCKETS,
};
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Prometheus metric type
enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

/// Write a simple metric (counter or gauge) with service label
fn write_metric(
    output: &mut String,
    name: &str,
    help: &str,
    typ: MetricType,
    service: &str,
    val: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name}{{service=\"{service}\"}} {val}");
}

/// Write a gauge metric with f64 value
fn write_gauge_f64(output: &mut String, name: &str, help: &str, service: &str, val: f64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} gauge");
    let _ = writeln!(output, "{name}{{service=\"{service}\"}} {val:.6}");
}

/// Write a histogram metric with buckets, sum, and count
fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    service: &str,
    buckets: &[u64; METRICS_NUM_BUCKETS],
    bounds: &[u64; 10],
    avg: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} histogram");

    let mut cumulative = 0u64;
    for (i, &bound) in bounds.iter().enumerate() {
        cumulative += buckets[i];
        let _ =
            writeln!(output, "{name}_bucket{{service=\"{service}\",le=\"{bound}\"}} {cumulative}");
    }
    cumulative += buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{service=\"{service}\",le=\"+Inf\"}} {cumulative}");

    let count: u64 = buckets.iter().sum();
    let sum = avg * count;
    let _ = writeln!(output, "{name}_sum{{service=\"{service}\"}} {sum}");
    let _ = writeln!(output, "{name}_count{{service=\"{service}\"}} {count}");
}

/// Format metrics in Prometheus text exposition format
///
/// Uses the non-resetting snapshot so scrapes never consume samples
/// from the interval summary log.
fn format_prometheus_metrics(metrics: &Metrics, service_id: &str) -> String {
    let summary = metrics.snapshot();
    let mut output = String::with_capacity(4096);

    write_incident_metrics(&mut output, service_id, &summary);
    write_latency_metrics(&mut output, service_id, &summary);
    write_outcome_metrics(&mut output, service_id, &summary);
    write_distance_metrics(&mut output, service_id, &summary);
    write_unit_assignments(&mut output, service_id, metrics);

    output
}

fn write_incident_metrics(output: &mut String, service: &str, summary: &MetricsSummary) {
    write_metric(
        output,
        "dispatch_incidents_total",
        "Total incidents processed to a decision",
        MetricType::Counter,
        service,
        summary.incidents_total,
    );
    write_gauge_f64(
        output,
        "dispatch_incidents_per_sec",
        "Incidents processed per second",
        service,
        summary.incidents_per_sec,
    );
    write_metric(
        output,
        "dispatch_roster_size",
        "Units in the last roster snapshot",
        MetricType::Gauge,
        service,
        summary.roster_size,
    );
}

fn write_latency_metrics(output: &mut String, service: &str, summary: &MetricsSummary) {
    write_histogram(
        output,
        "dispatch_match_latency_us",
        "Ingest-to-decision latency in microseconds",
        service,
        &summary.lat_buckets,
        &METRICS_BUCKET_BOUNDS,
        summary.avg_match_latency_us,
    );

    write_metric(
        output,
        "dispatch_match_latency_p50_us",
        "50th percentile match latency",
        MetricType::Gauge,
        service,
        summary.lat_p50_us,
    );
    write_metric(
        output,
        "dispatch_match_latency_p95_us",
        "95th percentile match latency",
        MetricType::Gauge,
        service,
        summary.lat_p95_us,
    );
    write_metric(
        output,
        "dispatch_match_latency_p99_us",
        "99th percentile match latency",
        MetricType::Gauge,
        service,
        summary.lat_p99_us,
    );
    write_metric(
        output,
        "dispatch_match_latency_max_us",
        "Maximum match latency",
        MetricType::Gauge,
        service,
        summary.max_match_latency_us,
    );
}

fn write_outcome_metrics(output: &mut String, service: &str, summary: &MetricsSummary) {
    write_metric(
        output,
        "dispatch_matched_total",
        "Incidents that selected a unit",
        MetricType::Counter,
        service,
        summary.matched_total,
    );
    write_metric(
        output,
        "dispatch_no_match_total",
        "Incidents that resolved to no match",
        MetricType::Counter,
        service,
        summary.no_match_total,
    );
    write_metric(
        output,
        "dispatch_malformed_lines_total",
        "Input lines rejected at parse",
        MetricType::Counter,
        service,
        summary.malformed_total,
    );
    write_metric(
        output,
        "dispatch_roster_errors_total",
        "Roster snapshots that failed",
        MetricType::Counter,
        service,
        summary.roster_errors_total,
    );
}

fn write_distance_metrics(output: &mut String, service: &str, summary: &MetricsSummary) {
    write_histogram(
        output,
        "dispatch_match_distance_m",
        "Distance from incident to selected unit in meters",
        service,
        &summary.match_distance_buckets,
        &METRICS_MATCH_DIST_BOUNDS,
        summary.match_distance_avg_m,
    );
    write_metric(
        output,
        "dispatch_match_distance_avg_m",
        "Average match distance",
        MetricType::Gauge,
        service,
        summary.match_distance_avg_m,
    );
}

fn write_unit_assignments(output: &mut String, service: &str, metrics: &Metrics) {
    let _ = writeln!(output, "# HELP dispatch_unit_assignments_total Matches won per unit");
    let _ = writeln!(output, "# TYPE dispatch_unit_assignments_total counter");
    for (unit_id, count) in metrics.unit_assignments() {
        let _ = writeln!(
            output,
            "dispatch_unit_assignments_total{{service=\"{service}\",unit=\"{unit_id}\"}} {count}"
        );
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    metrics: Arc<Metrics>,
    service_id: Arc<String>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = format_prometheus_metrics(&metrics, &service_id);
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
                .body(Full::new(Bytes::from(body)))
                .expect("static response should not fail"))
        }
        (&Method::GET, "/health") => Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("ok")))
            .expect("static response should not fail")),
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .expect("static response should not fail")),
    }
}

/// Start the Prometheus metrics HTTP server
pub async fn start_metrics_server(
    port: u16,
    metrics: Arc<Metrics>,
    service_id: String,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    let service_id = Arc::new(service_id);

    info!(port = %port, service = %service_id, "prometheus_metrics_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let metrics = metrics.clone();
                        let service_id = service_id.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let metrics = metrics.clone();
                                let service_id = service_id.clone();
                                async move { handle_request(req, metrics, service_id).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "prometheus_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "prometheus_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("prometheus_metrics_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}
