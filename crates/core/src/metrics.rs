//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job lifecycle (started, finished by outcome, live)
//! - File provisioning (create/close latency)
//! - Stray worker signals

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs accepted into the registry.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("handoff_jobs_started_total", "Total generation jobs started").unwrap()
});

/// Jobs concluded, by outcome.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("handoff_jobs_finished_total", "Total generation jobs finished"),
        &["result"], // "success", "provision_failed", "generation_failed", ...
    )
    .unwrap()
});

/// Jobs currently in the registry.
pub static JOBS_LIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("handoff_jobs_live", "Number of generation jobs in flight").unwrap()
});

/// Completion signals for unknown or already finishing jobs.
pub static STRAY_SIGNALS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "handoff_stray_signals_total",
        "Total completion signals that matched no generating job",
    )
    .unwrap()
});

// =============================================================================
// Provisioner Metrics
// =============================================================================

/// File operation duration in seconds.
pub static FILE_OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "handoff_file_op_duration_seconds",
            "Duration of output file create/close operations",
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["op"], // "create", "close"
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOBS_LIVE.clone()),
        Box::new(STRAY_SIGNALS.clone()),
        Box::new(FILE_OP_DURATION.clone()),
    ]
}
