/// Metrics and telemetry for Canvas Hub
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Status transitions and record creation/removal per entity
/// - Background job execution
/// - AI collaborator calls

use crate::error::{HubError, HubResult};
use lazy_static::lazy_static;
use prometheus::{
    register_gauge, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, Encoder, Gauge, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec,
    TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hub_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "hub_http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Active HTTP requests
    pub static ref HTTP_REQUESTS_ACTIVE: IntGauge = register_int_gauge!(
        "hub_http_requests_active",
        "Number of HTTP requests currently being processed"
    )
    .unwrap();

    // ========== Entity Metrics ==========

    /// Applied status transitions by entity and action
    pub static ref TRANSITIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hub_transitions_total",
        "Total number of applied status transitions",
        &["entity", "action"]
    )
    .unwrap();

    /// Transitions blocked by a guard or missing reason
    pub static ref TRANSITIONS_REJECTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hub_transitions_rejected_total",
        "Total number of rejected status transitions",
        &["entity", "action"]
    )
    .unwrap();

    /// Records created or removed by entity
    pub static ref RECORD_CHANGES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hub_record_changes_total",
        "Total number of record creations and removals",
        &["entity", "change"]
    )
    .unwrap();

    /// Records held across tenants by entity
    pub static ref RECORDS: IntGaugeVec = register_int_gauge_vec!(
        "hub_records",
        "Number of records held in memory",
        &["entity"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hub_background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();

    /// Background job duration in seconds
    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "hub_background_job_duration_seconds",
        "Background job execution time in seconds",
        &["job_type"],
        vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // ========== Collaborator Metrics ==========

    /// AI collaborator calls by tool and outcome
    pub static ref AI_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hub_ai_calls_total",
        "Total number of AI collaborator calls",
        &["tool", "outcome"]
    )
    .unwrap();

    // ========== System Metrics ==========

    /// Application uptime in seconds
    pub static ref UPTIME_SECONDS: Gauge = register_gauge!(
        "hub_uptime_seconds",
        "Application uptime in seconds"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> HubResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| HubError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| HubError::Internal(format!("Metrics are not UTF-8: {}", e)))
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a transition attempt
pub fn record_transition(entity: &str, action: &str, applied: bool) {
    let counter = if applied {
        &*TRANSITIONS_TOTAL
    } else {
        &*TRANSITIONS_REJECTED_TOTAL
    };
    counter.with_label_values(&[entity, action]).inc();
}

/// Record a creation or removal
pub fn record_record_change(entity: &str, change: &str) {
    RECORD_CHANGES_TOTAL.with_label_values(&[entity, change]).inc();
}

/// Set the in-memory record count for an entity
pub fn set_record_count(entity: &str, count: usize) {
    RECORDS.with_label_values(&[entity]).set(count as i64);
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str, duration: f64) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_type])
        .observe(duration);
}

/// Record an AI collaborator call
pub fn record_ai_call(tool: &str, success: bool) {
    AI_CALLS_TOTAL
        .with_label_values(&[tool, if success { "success" } else { "failure" }])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/v1/subscriptions", 200, 0.05);
        let metrics = render_metrics().unwrap();
        assert!(metrics.contains("hub_http_requests_total"));
        assert!(metrics.contains("hub_http_request_duration_seconds"));
    }

    #[test]
    fn test_record_transition() {
        record_transition("subscription", "pause", true);
        record_transition("kyc", "reject", false);
        let metrics = render_metrics().unwrap();
        assert!(metrics.contains("hub_transitions_total"));
        assert!(metrics.contains("hub_transitions_rejected_total"));
    }

    #[test]
    fn test_record_background_job() {
        record_background_job("subscription_sweep", "success", 0.01);
        set_record_count("subscriptions", 6);
        let metrics = render_metrics().unwrap();
        assert!(metrics.contains("hub_background_jobs_total"));
        assert!(metrics.contains("hub_records"));
    }
}
