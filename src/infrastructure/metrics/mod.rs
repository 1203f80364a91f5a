//! Prometheus Metrics Module
//!
//! # Metrics Collected
//! - Route guard decisions by outcome
//! - Rate limit rejections by limiter
//! - Sessions expired by the store's timer, by reason
//! - Backend query duration histograms

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Route guard outcomes: "allow" or the deny reason
pub static GUARD_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("guard_decisions_total", "Route authorizer decisions").namespace("quiz_gate"),
        &["outcome"],
    )
    .expect("Failed to create GUARD_DECISIONS_TOTAL metric")
});

/// Requests rejected by a fixed-window limiter
pub static RATE_LIMIT_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rate_limit_rejections_total", "Attempts denied by rate limiters")
            .namespace("quiz_gate"),
        &["limiter"],
    )
    .expect("Failed to create RATE_LIMIT_REJECTIONS_TOTAL metric")
});

/// Sessions destroyed by the expiry timer
pub static SESSIONS_EXPIRED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sessions_expired_total", "Sessions expired by the activity timer")
            .namespace("quiz_gate"),
        &["reason"],
    )
    .expect("Failed to create SESSIONS_EXPIRED_TOTAL metric")
});

/// Database query duration histogram
pub static DB_QUERY_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];
    HistogramVec::new(
        HistogramOpts::new("db_query_duration_seconds", "Database query latency in seconds")
            .namespace("quiz_gate")
            .buckets(buckets),
        &["operation", "table"],
    )
    .expect("Failed to create DB_QUERY_DURATION_SECONDS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(GUARD_DECISIONS_TOTAL.clone()))
        .expect("Failed to register GUARD_DECISIONS_TOTAL");
    registry
        .register(Box::new(RATE_LIMIT_REJECTIONS_TOTAL.clone()))
        .expect("Failed to register RATE_LIMIT_REJECTIONS_TOTAL");
    registry
        .register(Box::new(SESSIONS_EXPIRED_TOTAL.clone()))
        .expect("Failed to register SESSIONS_EXPIRED_TOTAL");
    registry
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("Failed to register DB_QUERY_DURATION_SECONDS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_guard_decision(outcome: &str) {
    GUARD_DECISIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_rate_limit_rejection(limiter: &str) {
    RATE_LIMIT_REJECTIONS_TOTAL.with_label_values(&[limiter]).inc();
}

pub fn record_session_expired(reason: &str) {
    SESSIONS_EXPIRED_TOTAL.with_label_values(&[reason]).inc();
}

/// Helper to record database query metrics
pub fn record_db_query(operation: &str, table: &str, duration_secs: f64) {
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(duration_secs);
}
