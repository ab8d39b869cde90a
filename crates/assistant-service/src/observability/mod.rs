//! Observability for the meeting assistant.
//!
//! Logs go through `tracing` with `assistant.*` targets; the subscriber is
//! installed by the binary. Metrics are exported in Prometheus text format
//! on `GET /metrics`.

pub mod metrics;
