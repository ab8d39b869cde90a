//! HTTP routes for the meeting assistant.
//!
//! Defines the Axum router and application state.

use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::runner::AssistantRunner;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Request timeout for every endpoint.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Launches agent runs and owns the call registry.
    pub runner: AssistantRunner,
}

/// Build the application routes.
///
/// - `POST /start-assistant` - launch the agent for a call
/// - `GET /transcript/:call_id` - transcript collected so far
/// - `GET /status/:call_id` - whether the call session is live
/// - `GET /health` - liveness probe
/// - `GET /metrics` - Prometheus metrics
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/start-assistant", post(handlers::start_assistant))
        .route("/transcript/:call_id", get(handlers::get_transcript))
        .route("/status/:call_id", get(handlers::get_status))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost)
    api_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn(http_metrics_middleware))
}
