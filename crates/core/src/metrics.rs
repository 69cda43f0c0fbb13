//! Prometheus metrics for the harvest pipeline.
//!
//! This module provides metrics for:
//! - Page fetches (by outcome)
//! - Records collected and persisted
//! - Run outcomes and per-phase durations

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Fetch Region
// =============================================================================

/// Page fetches by result.
pub static PAGE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("harvester_page_fetches_total", "Total page fetches"),
        &["result"], // "ok", "failed", "skipped"
    )
    .unwrap()
});

/// Raw records retained after the cap.
pub static RECORDS_COLLECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "harvester_records_collected_total",
        "Total raw records retained after the fetch phase",
    )
    .unwrap()
});

// =============================================================================
// Persistence
// =============================================================================

/// Records durably committed.
pub static RECORDS_PERSISTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "harvester_records_persisted_total",
        "Total records committed to storage",
    )
    .unwrap()
});

/// Batches rolled back.
pub static PERSIST_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "harvester_persist_failures_total",
        "Total persistence batches rolled back",
    )
    .unwrap()
});

// =============================================================================
// Runs
// =============================================================================

/// Harvest runs by result.
pub static RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("harvester_runs_total", "Total harvest runs"),
        &["result"], // "persisted", "persist_failed", "error"
    )
    .unwrap()
});

/// Phase durations in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "harvester_run_duration_seconds",
            "Duration of harvest phases",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["phase"], // "collect", "transform", "persist"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PAGE_FETCHES.clone()),
        Box::new(RECORDS_COLLECTED.clone()),
        Box::new(RECORDS_PERSISTED.clone()),
        Box::new(PERSIST_FAILURES.clone()),
        Box::new(RUNS.clone()),
        Box::new(RUN_DURATION.clone()),
    ]
}
