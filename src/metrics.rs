// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Designate webhook.
//!
//! Metric names keep the `external_dns_webhook_` prefix used by external-dns webhook
//! providers so existing dashboards keep working.
//!
//! The reconciliation engine never touches the global registry directly. Transport
//! code receives an [`ApiMetrics`] capability instead, so tests can run against
//! [`NoopMetrics`] without a metrics backend.
//!
//! # Example
//!
//! ```rust,no_run
//! use designate_webhook::metrics::{ApiMetrics, PrometheusMetrics};
//!
//! let metrics = PrometheusMetrics;
//! metrics.record_call("list_zones");
//! metrics.record_latency("list_zones", std::time::Duration::from_millis(20));
//! ```

use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all webhook metrics
const METRICS_NAMESPACE: &str = "external_dns_webhook";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via the `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// OpenStack API Metrics
// ============================================================================

/// Whether the webhook holds a working connection to the OpenStack API (1) or not (0)
pub static OPENSTACK_CONNECTION: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::with_opts(Opts::new(
        format!("{METRICS_NAMESPACE}_openstack_connection"),
        "Indicates if the webhook has a connection to the OpenStack API (1 for connected, 0 for not connected)",
    ))
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Total number of OpenStack API calls
pub static API_CALLS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::with_opts(Opts::new(
        format!("{METRICS_NAMESPACE}_total_api_calls"),
        "Total number of API calls",
    ))
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of failed OpenStack API calls
pub static FAILED_API_CALLS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::with_opts(Opts::new(
        format!("{METRICS_NAMESPACE}_failed_api_calls_total"),
        "Total number of failed API calls",
    ))
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Latency of OpenStack API calls in seconds
///
/// Labels:
/// - `method`: Client operation (e.g., `list_zones`, `create_record_set`)
pub static API_CALL_LATENCY_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_api_call_latency_seconds"),
        "Latency of OpenStack API calls",
    )
    .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["method"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Metrics Capability
// ============================================================================

/// Sink for OpenStack API call statistics, injected into the transport client.
///
/// `method` names the client operation (`list_zones`, `create_record_set`, ...).
/// A sink decides which statistics it breaks down by it.
pub trait ApiMetrics: Send + Sync {
    /// Record one API call
    fn record_call(&self, method: &str);

    /// Record one failed API call
    fn record_failure(&self, method: &str);

    /// Record the latency of one API call
    fn record_latency(&self, method: &str, elapsed: Duration);
}

/// [`ApiMetrics`] backed by the global Prometheus registry.
///
/// Call and failure totals are single unlabelled counters; only the latency
/// histogram carries the `method` label.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl ApiMetrics for PrometheusMetrics {
    fn record_call(&self, _method: &str) {
        API_CALLS_TOTAL.inc();
    }

    fn record_failure(&self, _method: &str) {
        FAILED_API_CALLS_TOTAL.inc();
    }

    fn record_latency(&self, method: &str, elapsed: Duration) {
        API_CALL_LATENCY_SECONDS
            .with_label_values(&[method])
            .observe(elapsed.as_secs_f64());
    }
}

/// [`ApiMetrics`] that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl ApiMetrics for NoopMetrics {
    fn record_call(&self, _method: &str) {}

    fn record_failure(&self, _method: &str) {}

    fn record_latency(&self, _method: &str, _elapsed: Duration) {}
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Set the OpenStack connection gauge
///
/// # Arguments
/// * `connected` - Whether authentication against OpenStack succeeded
pub fn set_openstack_connection(connected: bool) {
    OPENSTACK_CONNECTION.set(if connected { 1.0 } else { 0.0 });
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
