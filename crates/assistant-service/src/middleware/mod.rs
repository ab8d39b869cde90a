//! HTTP middleware for the meeting assistant.

mod http_metrics;

pub use http_metrics::http_metrics_middleware;
