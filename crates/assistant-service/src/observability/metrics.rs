//! Metrics definitions for the meeting assistant.
//!
//! All metrics follow Prometheus naming conventions:
//! - `assistant_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Call ids are never labels. Endpoints are normalized so
//! `/transcript/{call_id}` and `/status/{call_id}` each map to one value.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("assistant_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Answers go through the realtime model
        .set_buckets_for_metric(
            Matcher::Prefix("assistant_answer".to_string()),
            &[0.100, 0.250, 0.500, 1.000, 2.000, 5.000, 10.000, 30.000],
        )
        .map_err(|e| format!("Failed to set answer buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `assistant_http_requests_total`, `assistant_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("assistant_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("assistant_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/start-assistant" => "/start-assistant",
        p if p.starts_with("/transcript/") => "/transcript/{call_id}",
        p if p.starts_with("/status/") => "/status/{call_id}",
        _ => "other",
    }
}

// ============================================================================
// Assistant Metrics
// ============================================================================

/// Record an agent launch.
///
/// Metric: `assistant_launches_total`
/// Labels: `status` (success, error)
pub fn record_launch(status: &'static str) {
    counter!("assistant_launches_total", "status" => status).increment(1);
}

/// Set the number of calls with a live session.
///
/// Metric: `assistant_active_calls`
pub fn set_active_calls(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("assistant_active_calls").set(count as f64);
}

/// Record a transcript line kept for a call.
///
/// Metric: `assistant_transcript_lines_total`
pub fn record_transcript_line() {
    counter!("assistant_transcript_lines_total").increment(1);
}

/// Record a triggered question.
///
/// Metric: `assistant_answers_total`, `assistant_answer_duration_seconds`
/// Labels: `status` (success, error)
pub fn record_answer(status: &'static str, duration: Duration) {
    histogram!("assistant_answer_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
    counter!("assistant_answers_total", "status" => status).increment(1);
}
