//! Prometheus metrics for design-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// Metric names as constants for consistency
const SAVES_TOTAL: &str = "design_saves_total";
const SAVE_DURATION: &str = "design_save_duration_seconds";
const ELEMENTS_DROPPED_TOTAL: &str = "design_elements_dropped_total";
const ASSET_UPLOADS_TOTAL: &str = "design_asset_uploads_total";
const VALIDATION_FAILURES_TOTAL: &str = "design_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a finished save request.
///
/// # Arguments
///
/// * `operation` - "create" or "update"
/// * `outcome` - "ok" or the error code returned to the client
/// * `duration_secs` - Time spent sanitizing and persisting
pub fn record_save(operation: &str, outcome: &str, duration_secs: f64) {
    counter!(
        SAVES_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(
        SAVE_DURATION,
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Record elements dropped for an unrecognized type.
pub fn record_elements_dropped(count: usize) {
    if count > 0 {
        counter!(ELEMENTS_DROPPED_TOTAL).increment(count as u64);
    }
}

/// Record an asset upload attempt.
///
/// # Arguments
///
/// * `path` - "primary" (data URI) or "fallback" (temp file)
/// * `success` - Whether the store returned a URL
pub fn record_asset_upload(path: &str, success: bool) {
    counter!(
        ASSET_UPLOADS_TOTAL,
        "path" => path.to_string(),
        "outcome" => if success { "success" } else { "failure" }
    )
    .increment(1);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `kind` - Which check failed (design_id, owner_id, element_count, ...)
pub fn record_validation_failure(kind: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "kind" => kind.to_string()
    )
    .increment(1);
}
