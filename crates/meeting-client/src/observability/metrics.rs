//! Metric definitions for the meeting client.
//!
//! All metrics use the `meeting_client_` prefix. Label values are bounded:
//! statuses and outcomes come from fixed string sets, features from the
//! `Feature` enum. Call ids and user ids are never used as labels.

use metrics::{counter, histogram};
use std::time::Duration;

fn availability(available: bool) -> &'static str {
    if available {
        "available"
    } else {
        "unavailable"
    }
}

/// Record a device capability probe.
///
/// Metric: `meeting_client_device_probes_total`
/// Labels: `camera`, `microphone` (available, unavailable)
pub fn record_probe(has_camera: bool, has_microphone: bool) {
    counter!("meeting_client_device_probes_total",
        "camera" => availability(has_camera),
        "microphone" => availability(has_microphone)
    )
    .increment(1);
}

/// Record a token exchange attempt.
///
/// Metric: `meeting_client_token_exchanges_total`
/// Labels: `status` (success, missing, error)
pub fn record_token_exchange(status: &str) {
    counter!("meeting_client_token_exchanges_total", "status" => status.to_string()).increment(1);
}

/// Record a connection manager request.
///
/// Metric: `meeting_client_connections_total`
/// Labels: `status` (connected, reused, error)
pub fn record_connection(status: &str) {
    counter!("meeting_client_connections_total", "status" => status.to_string()).increment(1);
}

/// Record how a session attempt finished.
///
/// Metric: `meeting_client_sessions_total`
/// Labels: `outcome` (joined, failed, ended)
pub fn record_session_outcome(outcome: &str) {
    counter!("meeting_client_sessions_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record time from `start` to `Joined`.
///
/// Metric: `meeting_client_join_duration_seconds`
pub fn record_join_duration(duration: Duration) {
    histogram!("meeting_client_join_duration_seconds").record(duration.as_secs_f64());
}

/// Record a post-join feature activation.
///
/// Metric: `meeting_client_feature_activations_total`
/// Labels: `feature`, `status` (success, error)
pub fn record_feature_activation(feature: &str, status: &str) {
    counter!("meeting_client_feature_activations_total",
        "feature" => feature.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a session cleanup.
///
/// Metric: `meeting_client_cleanups_total`
/// Labels: `reason` (local_leave, remote_ended, teardown)
pub fn record_cleanup(reason: &str) {
    counter!("meeting_client_cleanups_total", "reason" => reason.to_string()).increment(1);
}

/// Record a backend assistant notification.
///
/// Metric: `meeting_client_assistant_notifications_total`
/// Labels: `status` (success, error)
pub fn record_assistant_notification(status: &str) {
    counter!("meeting_client_assistant_notifications_total", "status" => status.to_string())
        .increment(1);
}
