//! Metrics collection for the pollers
//!
//! Prometheus counters and gauges for tick outcomes, fetch latency, cache
//! effectiveness and subscriber failures.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, Encoder,
    HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    /// Counter for poll ticks by outcome
    static ref POLL_TICKS: IntCounterVec = register_int_counter_vec!(
        "agentops_poll_ticks_total",
        "Total number of poll ticks",
        &["service", "tier", "status"]
    ).unwrap();

    /// Histogram for endpoint fetch duration
    static ref FETCH_DURATION: HistogramVec = register_histogram_vec!(
        "agentops_fetch_duration_seconds",
        "Endpoint fetch duration in seconds",
        &["service"],
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    /// Counter for cache lookups
    static ref CACHE_LOOKUPS: IntCounterVec = register_int_counter_vec!(
        "agentops_cache_lookups_total",
        "Total number of response cache lookups",
        &["result"]
    ).unwrap();

    /// Counter for subscriber callbacks that failed or panicked
    static ref SUBSCRIBER_FAILURES: IntCounterVec = register_int_counter_vec!(
        "agentops_subscriber_failures_total",
        "Total number of failed subscriber callbacks",
        &["event"]
    ).unwrap();

    /// Gauge for armed poll timers
    static ref ACTIVE_TIMERS: IntGaugeVec = register_int_gauge_vec!(
        "agentops_active_timers",
        "Number of armed poll timers",
        &["service"]
    ).unwrap();
}

/// Metrics collector scoped to one polling service
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    service: String,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Record the outcome of a tier refresh
    pub fn record_tick(&self, tier: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        POLL_TICKS
            .with_label_values(&[&self.service, tier, status])
            .inc();
    }

    /// Record one endpoint fetch
    pub fn record_fetch(&self, duration_secs: f64) {
        FETCH_DURATION
            .with_label_values(&[&self.service])
            .observe(duration_secs);
    }

    /// Update the armed timer count
    pub fn set_active_timers(&self, count: usize) {
        ACTIVE_TIMERS
            .with_label_values(&[&self.service])
            .set(count as i64);
    }
}

/// Record a cache lookup
pub fn record_cache_lookup(hit: bool) {
    CACHE_LOOKUPS
        .with_label_values(&[if hit { "hit" } else { "miss" }])
        .inc();
}

/// Record a failed subscriber callback
pub fn record_subscriber_failure(event: &str) {
    SUBSCRIBER_FAILURES.with_label_values(&[event]).inc();
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[inline]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time in seconds
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Export metrics in Prometheus format
pub fn export_metrics() -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Failed to convert metrics to UTF-8: {}", e).into())
}
