//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the harvester server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Stored item count (collected dynamically)
//! - Harvest pipeline metrics registered from the core crate

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "harvester_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("harvester_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "harvester_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Storage Metrics (collected dynamically)
// =============================================================================

/// Persisted items.
pub static STORED_ITEMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("harvester_stored_items", "Number of persisted items").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Storage
    registry.register(Box::new(STORED_ITEMS.clone())).unwrap();

    // Core metrics (fetches, runs, persistence)
    for metric in harvester_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values
/// from the store.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    match state.store().stats() {
        Ok(stats) => STORED_ITEMS.set(stats.items),
        Err(e) => warn!(error = %e, "Failed to read store stats for metrics"),
    }
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize path for metrics labels (replace IDs with placeholders).
///
/// This prevents high cardinality in metrics by replacing dynamic path segments.
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/runs/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/runs/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/items/12345";
        assert_eq!(normalize_path(path), "/api/v1/items/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/items/stats";
        assert_eq!(normalize_path(path), "/api/v1/items/stats");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("harvester_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        harvester_core::metrics::PAGE_FETCHES
            .with_label_values(&["ok"])
            .inc_by(0);
        harvester_core::metrics::RUNS
            .with_label_values(&["persisted"])
            .inc_by(0);
        STORED_ITEMS.set(0);

        let output = encode_metrics();
        assert!(output.contains("harvester_page_fetches_total"));
        assert!(output.contains("harvester_runs_total"));
        assert!(output.contains("harvester_stored_items"));
        assert!(output.contains("harvester_records_persisted_total"));
    }
}
