//! Metrics and observability utilities
//!
//! Prometheus metrics for the data-access layer: backend calls, query
//! cache hits, mutations and the invalidations they trigger.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Papertok metrics
pub const METRICS_PREFIX: &str = "papertok";

/// Histogram buckets for request latency (in seconds)
/// Mock latencies sit between 300ms and 1s
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.300, // 300ms - follow / add
    0.500, // 500ms
    0.800, // 800ms - search
    1.000, // 1s - composite create
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
    30.00, // 30s - default remote timeout
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Gateway requests
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Remote backend
    describe_counter!(
        format!("{}_remote_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total calls made to the backend API"
    );

    describe_histogram!(
        format!("{}_remote_call_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Backend API call latency in seconds"
    );

    // Query cache
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Reads answered from the query cache"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Reads that went to the data source"
    );

    describe_counter!(
        format!("{}_cache_invalidations_total", METRICS_PREFIX),
        Unit::Count,
        "Query keys marked stale by mutations"
    );

    // Mutations
    describe_counter!(
        format!("{}_mutations_total", METRICS_PREFIX),
        Unit::Count,
        "Total mutations executed"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record one backend call; `status` is `None` when the backend was unreachable
pub fn record_remote_call(endpoint: &str, status: Option<u16>, duration_secs: f64) {
    let status = status.map_or_else(|| "unreachable".to_string(), |s| s.to_string());

    counter!(
        format!("{}_remote_calls_total", METRICS_PREFIX),
        "endpoint" => endpoint.to_string(),
        "status" => status
    )
    .increment(1);

    histogram!(
        format!("{}_remote_call_duration_seconds", METRICS_PREFIX),
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

/// Helper to record cache metrics, labelled by the key's root segment
pub fn record_cache(hit: bool, query: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "query" => query.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "query" => query.to_string()
        )
        .increment(1);
    }
}

pub fn record_invalidation(query: &str, entries: usize) {
    counter!(
        format!("{}_cache_invalidations_total", METRICS_PREFIX),
        "query" => query.to_string()
    )
    .increment(entries as u64);
}

pub fn record_mutation(mutation: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_mutations_total", METRICS_PREFIX),
        "mutation" => mutation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
