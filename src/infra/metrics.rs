//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting is the only operation
//! that needs synchronization (via atomic swap). Per-unit assignment
//! counts sit behind a lock because matches are low-rate compared to
//! ingest.
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Prometheus-style exponential bucket boundaries (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
const BUCKET_BOUNDS: [u64; 10] = [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
const NUM_BUCKETS: usize = 11;

/// Match distance bucket boundaries (meters)
/// Buckets: ≤250, ≤500, ≤1000, ≤2000, ≤4000, ≤8000, ≤16000, ≤32000, ≤64000, ≤128000, >128000 m
const MATCH_DIST_BOUNDS: [u64; 10] =
    [250, 500, 1000, 2000, 4000, 8000, 16000, 32000, 64000, 128000];

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Compute bucket index for a match distance (m) using binary search
#[inline]
fn match_dist_bucket_index(dist_m: u64) -> usize {
    MATCH_DIST_BOUNDS.partition_point(|&bound| bound < dist_m)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Load all bucket values without resetting
#[inline]
fn load_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.load(Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    // Ceiling so a single sample targets itself instead of rank 0
    let target = (total as f64 * percentile).ceil() as u64;
    let mut cumulative = 0u64;

    // Upper bounds for each bucket (last bucket uses 2x the previous bound)
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200, 102400];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free using atomics, except per-unit
/// assignment counts which take a short write lock.
/// The `report()` method atomically swaps periodic counters to get a
/// consistent snapshot.
pub struct Metrics {
    /// Total incidents ever processed to a decision (monotonic)
    incidents_total: AtomicU64,
    /// Incidents since last report (reset on report)
    incidents_since_report: AtomicU64,
    /// Sum of ingest-to-decision latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max ingest-to-decision latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Ingest-to-decision latency histogram buckets (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Incidents that selected a unit (monotonic)
    matched_total: AtomicU64,
    /// Incidents that resolved to no match (monotonic)
    no_match_total: AtomicU64,
    /// Input lines rejected at parse (monotonic)
    malformed_total: AtomicU64,
    /// Roster snapshots that failed (monotonic)
    roster_errors_total: AtomicU64,
    /// Match distance histogram buckets (meters, cumulative)
    /// Bounds: ≤250, ≤500, ≤1000, ≤2000, ≤4000, ≤8000, ≤16000, ≤32000, ≤64000, ≤128000, >128000
    match_distance_buckets: [AtomicU64; NUM_BUCKETS],
    /// Sum of match distances (m) for average calculation
    match_distance_sum_m: AtomicU64,
    /// Units in the last roster snapshot (updated per dispatch)
    roster_size: AtomicU64,
    /// Matches per unit id (cold path)
    unit_assignments: RwLock<FxHashMap<String, u64>>,
    /// Last report time (only accessed from reporter, not atomic)
    last_report_time: Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            incidents_total: AtomicU64::new(0),
            incidents_since_report: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            matched_total: AtomicU64::new(0),
            no_match_total: AtomicU64::new(0),
            malformed_total: AtomicU64::new(0),
            roster_errors_total: AtomicU64::new(0),
            match_distance_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            match_distance_sum_m: AtomicU64::new(0),
            roster_size: AtomicU64::new(0),
            unit_assignments: RwLock::new(FxHashMap::default()),
            last_report_time: Mutex::new(Instant::now()),
        }
    }

    /// Record an incident that reached a decision, with its latency (lock-free)
    #[inline]
    pub fn record_incident_processed(&self, latency_us: u64) {
        self.incidents_total.fetch_add(1, Ordering::Relaxed);
        self.incidents_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);

        let bucket = bucket_index(latency_us);
        self.latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);

        update_atomic_max(&self.latency_max_us, latency_us);
    }

    /// Record a selected match and its distance in meters (lock-free)
    #[inline]
    pub fn record_matched(&self, distance_m: u64) {
        self.matched_total.fetch_add(1, Ordering::Relaxed);
        let bucket = match_dist_bucket_index(distance_m);
        self.match_distance_buckets[bucket].fetch_add(1, Ordering::Relaxed);
        self.match_distance_sum_m.fetch_add(distance_m, Ordering::Relaxed);
    }

    /// Record an incident that resolved to no match (lock-free)
    #[inline]
    pub fn record_no_match(&self) {
        self.no_match_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected input line (lock-free)
    #[inline]
    pub fn record_malformed(&self) {
        self.malformed_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed roster snapshot (lock-free)
    #[inline]
    pub fn record_roster_error(&self) {
        self.roster_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a match against the winning unit id
    pub fn record_assignment(&self, unit_id: &str) {
        let mut assignments = self.unit_assignments.write();
        *assignments.entry(unit_id.to_string()).or_insert(0) += 1;
    }

    /// Set the roster size gauge (called per dispatch)
    #[inline]
    pub fn set_roster_size(&self, size: u64) {
        self.roster_size.store(size, Ordering::Relaxed);
    }

    /// Current roster size gauge
    #[inline]
    pub fn roster_size(&self) -> u64 {
        self.roster_size.load(Ordering::Relaxed)
    }

    /// Get total incidents processed
    #[inline]
    pub fn incidents_total(&self) -> u64 {
        self.incidents_total.load(Ordering::Relaxed)
    }

    /// Get total matches
    #[inline]
    pub fn matched_total(&self) -> u64 {
        self.matched_total.load(Ordering::Relaxed)
    }

    /// Get total no-match outcomes
    #[inline]
    pub fn no_match_total(&self) -> u64 {
        self.no_match_total.load(Ordering::Relaxed)
    }

    /// Get total rejected input lines
    #[inline]
    pub fn malformed_total(&self) -> u64 {
        self.malformed_total.load(Ordering::Relaxed)
    }

    /// Get total failed roster snapshots
    #[inline]
    #[allow(dead_code)]
    pub fn roster_errors_total(&self) -> u64 {
        self.roster_errors_total.load(Ordering::Relaxed)
    }

    /// Get per-unit match counts, sorted by unit id for stable output
    pub fn unit_assignments(&self) -> Vec<(String, u64)> {
        let assignments = self.unit_assignments.read();
        let mut counts: Vec<(String, u64)> =
            assignments.iter().map(|(id, &count)| (id.clone(), count)).collect();
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts
    }

    /// Calculate and return metrics summary, then reset periodic counters
    ///
    /// This is the only method that resets counters. It uses atomic swap
    /// to get a consistent snapshot while allowing concurrent updates.
    pub fn report(&self) -> MetricsSummary {
        // Swap periodic counters to zero and get their values
        let incidents_count = self.incidents_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        // Calculate elapsed time and reset
        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        self.summarize(incidents_count, latency_sum, max_latency, lat_buckets, elapsed)
    }

    /// Read-only summary for the Prometheus exporter
    ///
    /// Loads the same counters as `report()` without swapping them, so a
    /// scrape never steals samples from the interval summary log and
    /// concurrent scrapes see the same data.
    pub fn snapshot(&self) -> MetricsSummary {
        let incidents_count = self.incidents_since_report.load(Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.load(Ordering::Relaxed);
        let max_latency = self.latency_max_us.load(Ordering::Relaxed);
        let lat_buckets = load_buckets(&self.latency_buckets);
        let elapsed = self.last_report_time.lock().elapsed();

        self.summarize(incidents_count, latency_sum, max_latency, lat_buckets, elapsed)
    }

    fn summarize(
        &self,
        incidents_count: u64,
        latency_sum: u64,
        max_latency: u64,
        lat_buckets: [u64; NUM_BUCKETS],
        elapsed: Duration,
    ) -> MetricsSummary {
        // Monotonic counters (never reset)
        let incidents_total = self.incidents_total.load(Ordering::Relaxed);
        let matched_total = self.matched_total.load(Ordering::Relaxed);
        let no_match_total = self.no_match_total.load(Ordering::Relaxed);
        let malformed_total = self.malformed_total.load(Ordering::Relaxed);
        let roster_errors_total = self.roster_errors_total.load(Ordering::Relaxed);

        let incidents_per_sec = if elapsed.as_secs_f64() > 0.0 {
            incidents_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let avg_latency = if incidents_count > 0 { latency_sum / incidents_count } else { 0 };
        let lat_p50 = percentile_from_buckets(&lat_buckets, 0.50);
        let lat_p95 = percentile_from_buckets(&lat_buckets, 0.95);
        let lat_p99 = percentile_from_buckets(&lat_buckets, 0.99);

        // Match distance histogram (cumulative, never reset)
        let match_distance_buckets = load_buckets(&self.match_distance_buckets);
        let match_distance_sum = self.match_distance_sum_m.load(Ordering::Relaxed);
        let match_distance_count: u64 = match_distance_buckets.iter().sum();
        let match_distance_avg_m =
            if match_distance_count > 0 { match_distance_sum / match_distance_count } else { 0 };

        let roster_size = self.roster_size.load(Ordering::Relaxed);

        MetricsSummary {
            incidents_total,
            incidents_per_sec,
            avg_match_latency_us: avg_latency,
            max_match_latency_us: max_latency,
            lat_buckets,
            lat_p50_us: lat_p50,
            lat_p95_us: lat_p95,
            lat_p99_us: lat_p99,
            matched_total,
            no_match_total,
            malformed_total,
            roster_errors_total,
            match_distance_buckets,
            match_distance_avg_m,
            roster_size,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of histogram buckets (exported for the Prometheus endpoint)
pub const METRICS_NUM_BUCKETS: usize = NUM_BUCKETS;

/// Exported bucket bounds for Prometheus formatting
pub const METRICS_BUCKET_BOUNDS: [u64; 10] = BUCKET_BOUNDS;
pub const METRICS_MATCH_DIST_BOUNDS: [u64; 10] = MATCH_DIST_BOUNDS;

#[derive(Debug)]
#[allow(dead_code)]
pub struct MetricsSummary {
    pub incidents_total: u64,
    pub incidents_per_sec: f64,
    pub avg_match_latency_us: u64,
    pub max_match_latency_us: u64,
    /// Ingest-to-decision latency histogram buckets
    /// Bounds: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200 µs
    pub lat_buckets: [u64; NUM_BUCKETS],
    /// 50th percentile latency (µs)
    pub lat_p50_us: u64,
    /// 95th percentile latency (µs)
    pub lat_p95_us: u64,
    /// 99th percentile latency (µs)
    pub lat_p99_us: u64,
    pub matched_total: u64,
    pub no_match_total: u64,
    pub malformed_total: u64,
    pub roster_errors_total: u64,
    /// Match distance histogram buckets (m)
    /// Bounds: ≤250, ≤500, ≤1000, ≤2000, ≤4000, ≤8000, ≤16000, ≤32000, ≤64000, ≤128000, >128000 m
    pub match_distance_buckets: [u64; NUM_BUCKETS],
    /// Average match distance (m)
    pub match_distance_avg_m: u64,
    /// Units in the last roster snapshot
    pub roster_size: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            incidents_total = %self.incidents_total,
            incidents_per_sec = format!("{:.1}", self.incidents_per_sec),
            avg_latency_us = %self.avg_match_latency_us,
            max_latency_us = %self.max_match_latency_us,
            p50_us = %self.lat_p50_us,
            p95_us = %self.lat_p95_us,
            p99_us = %self.lat_p99_us,
            matched = %self.matched_total,
            no_match = %self.no_match_total,
            malformed = %self.malformed_total,
            match_distance_avg_m = %self.match_distance_avg_m,
            roster_size = %self.roster_size,
            "metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.incidents_total(), 0);
        assert_eq!(metrics.matched_total(), 0);
        assert_eq!(metrics.no_match_total(), 0);
        assert_eq!(metrics.malformed_total(), 0);
    }

    #[test]
    fn test_record_incident() {
        let metrics = Metrics::new();

        metrics.record_incident_processed(100);
        assert_eq!(metrics.incidents_total(), 1);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 100);

        metrics.record_incident_processed(200);
        assert_eq!(metrics.incidents_total(), 2);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 300);
    }

    #[test]
    fn test_record_matched_distance() {
        let metrics = Metrics::new();

        // 1010 m lands in the ≤2000 bucket
        metrics.record_matched(1010);
        assert_eq!(metrics.matched_total(), 1);
        assert_eq!(metrics.match_distance_buckets[3].load(Ordering::Relaxed), 1);
        assert_eq!(metrics.match_distance_sum_m.load(Ordering::Relaxed), 1010);

        // Cross-country distance lands in the overflow bucket
        metrics.record_matched(3_935_000);
        assert_eq!(metrics.match_distance_buckets[NUM_BUCKETS - 1].load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_outcomes() {
        let metrics = Metrics::new();

        metrics.record_no_match();
        metrics.record_malformed();
        metrics.record_malformed();
        metrics.record_roster_error();

        assert_eq!(metrics.no_match_total(), 1);
        assert_eq!(metrics.malformed_total(), 2);
        assert_eq!(metrics.roster_errors_total(), 1);
    }

    #[test]
    fn test_assignments_sorted_by_unit() {
        let metrics = Metrics::new();

        metrics.record_assignment("Unit_Bravo");
        metrics.record_assignment("Unit_Alpha");
        metrics.record_assignment("Unit_Bravo");

        let counts = metrics.unit_assignments();
        assert_eq!(
            counts,
            vec![("Unit_Alpha".to_string(), 1), ("Unit_Bravo".to_string(), 2)]
        );
    }

    #[test]
    fn test_report_resets_periodic_counters() {
        let metrics = Metrics::new();

        metrics.record_incident_processed(100);
        metrics.record_incident_processed(200);
        metrics.record_incident_processed(300);
        metrics.record_matched(1010);
        metrics.set_roster_size(4);

        let summary = metrics.report();
        assert_eq!(summary.incidents_total, 3);
        assert_eq!(summary.avg_match_latency_us, 200);
        assert_eq!(summary.max_match_latency_us, 300);
        // Median of {100, 200, 300} sits in the 200 bucket
        assert_eq!(summary.lat_p50_us, 200);
        assert_eq!(summary.matched_total, 1);
        assert_eq!(summary.match_distance_avg_m, 1010);
        assert_eq!(summary.roster_size, 4);

        // Periodic counters reset, monotonic ones survive
        let summary = metrics.report();
        assert_eq!(summary.incidents_total, 3);
        assert_eq!(summary.avg_match_latency_us, 0);
        assert_eq!(summary.max_match_latency_us, 0);
        assert_eq!(summary.matched_total, 1);
    }

    #[test]
    fn test_snapshot_keeps_periodic_counters() {
        let metrics = Metrics::new();

        metrics.record_incident_processed(100);
        metrics.record_incident_processed(300);

        // Repeated snapshots see the same data
        let first = metrics.snapshot();
        let second = metrics.snapshot();
        assert_eq!(first.avg_match_latency_us, 200);
        assert_eq!(second.avg_match_latency_us, 200);
        assert_eq!(second.max_match_latency_us, 300);
        assert_eq!(first.lat_buckets, second.lat_buckets);

        // The interval report still owns the full window
        let summary = metrics.report();
        assert_eq!(summary.avg_match_latency_us, 200);
        assert_eq!(summary.max_match_latency_us, 300);
        assert_eq!(summary.lat_buckets.iter().sum::<u64>(), 2);
    }

    #[test]
    fn test_percentile_of_single_sample() {
        let metrics = Metrics::new();

        // 5000 µs lands in the ≤6400 bucket; every percentile reports it
        metrics.record_incident_processed(5000);

        let summary = metrics.report();
        assert_eq!(summary.lat_p50_us, 6400);
        assert_eq!(summary.lat_p95_us, 6400);
        assert_eq!(summary.lat_p99_us, 6400);
    }
}
