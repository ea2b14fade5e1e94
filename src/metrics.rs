//! Prometheus metrics collection for anexia-webhook
//!
//! This module provides metrics collection for monitoring vendor traffic and
//! webhook request handling.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Gauge, HistogramVec,
};

//==============================================================================
// Metrics
//==============================================================================

lazy_static! {
    /// Total number of requests sent to the Anexia API
    pub static ref VENDOR_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "anexia_webhook_vendor_requests_total",
        "Total number of requests sent to the Anexia API",
        &["operation"]
    )
    .unwrap();

    /// Total number of failed Anexia API requests
    pub static ref VENDOR_ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "anexia_webhook_vendor_errors_total",
        "Total number of failed Anexia API requests",
        &["operation", "error_type"]
    )
    .unwrap();

    /// Total number of records created or deleted at the vendor
    pub static ref RECORD_CHANGES_TOTAL: CounterVec = register_counter_vec!(
        "anexia_webhook_record_changes_total",
        "Total number of records created or deleted",
        &["action"]
    )
    .unwrap();

    /// Consecutive failed provider operations
    pub static ref ERROR_COUNT: Gauge = register_gauge!(
        "anexia_webhook_error_count",
        "Current number of consecutive provider errors"
    )
    .unwrap();

    /// Webhook request duration histogram
    pub static ref REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "anexia_webhook_request_duration_seconds",
        "Webhook request duration in seconds",
        &["route"]
    )
    .unwrap();
}

//==============================================================================
// Public Functions
//==============================================================================

/// Records a request to the Anexia API
pub fn record_vendor_request(operation: &str) {
    VENDOR_REQUESTS_TOTAL.with_label_values(&[operation]).inc();
}

/// Records a failed Anexia API request
///
/// # Arguments
///
/// * `operation` - Vendor operation (e.g., "list_zones", "create_record")
/// * `error_type` - Type of error (e.g., "rate_limit", "network")
pub fn record_vendor_error(operation: &str, error_type: &str) {
    VENDOR_ERRORS_TOTAL
        .with_label_values(&[operation, error_type])
        .inc();
}

/// Records an applied record change ("created" or "deleted")
pub fn record_change(action: &str) {
    RECORD_CHANGES_TOTAL.with_label_values(&[action]).inc();
}

/// Sets the current error count
pub fn set_error_count(count: u64) {
    ERROR_COUNT.set(count as f64);
}

/// Starts a timer for a webhook route; the duration is observed on drop
pub fn start_request_timer(route: &str) -> HistogramTimer {
    REQUEST_DURATION_SECONDS
        .with_label_values(&[route])
        .start_timer()
}

/// Collects all metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

//==============================================================================
// Types
//==============================================================================

/// Histogram timer for measuring duration
pub type HistogramTimer = prometheus::HistogramTimer;

//==============================================================================
// Tests
//==============================================================================
