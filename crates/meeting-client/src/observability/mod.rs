//! Observability for the meeting client.
//!
//! The client library only emits; installing a recorder is left to the
//! embedding application. Every span uses `#[instrument(skip_all)]` with
//! explicitly allow-listed fields so credentials never reach a log line.
//!
//! # Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `meeting_client_device_probes_total` | Counter | `camera`, `microphone` |
//! | `meeting_client_token_exchanges_total` | Counter | `status` |
//! | `meeting_client_connections_total` | Counter | `status` |
//! | `meeting_client_sessions_total` | Counter | `outcome` |
//! | `meeting_client_join_duration_seconds` | Histogram | none |
//! | `meeting_client_feature_activations_total` | Counter | `feature`, `status` |
//! | `meeting_client_cleanups_total` | Counter | `reason` |
//! | `meeting_client_assistant_notifications_total` | Counter | `status` |

pub mod metrics;
