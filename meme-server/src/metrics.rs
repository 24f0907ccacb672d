//! Prometheus metrics for meme-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// Metric names as constants for consistency
const GENERATE_REQUESTS_TOTAL: &str = "ralphgen_generate_requests_total";
const GENERATE_DURATION: &str = "ralphgen_generate_duration_seconds";
const GALLERY_OPERATIONS_TOTAL: &str = "ralphgen_gallery_operations_total";
const GALLERY_ITEMS: &str = "ralphgen_gallery_items";
const VALIDATION_FAILURES_TOTAL: &str = "ralphgen_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a proxied generation request.
///
/// # Arguments
///
/// * `outcome` - "success", "upstream_error" or "unreachable"
/// * `duration_secs` - Time spent waiting on the upstream
pub fn record_generate(outcome: &str, duration_secs: f64) {
    counter!(GENERATE_REQUESTS_TOTAL, "outcome" => outcome.to_string()).increment(1);
    histogram!(GENERATE_DURATION).record(duration_secs);
}

/// Record a gallery operation.
///
/// # Arguments
///
/// * `operation` - "list", "save", "delete" or "image"
/// * `success` - Whether the operation succeeded
pub fn record_gallery_operation(operation: &str, success: bool) {
    counter!(
        GALLERY_OPERATIONS_TOTAL,
        "operation" => operation.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}

/// Update the number of indexed gallery items.
#[allow(clippy::cast_precision_loss)]
pub fn set_gallery_items(count: usize) {
    gauge!(GALLERY_ITEMS).set(count as f64);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (body_size, json, id, image)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}
