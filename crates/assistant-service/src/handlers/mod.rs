//! HTTP request handlers for the meeting assistant.

mod assistant;
mod health;
mod metrics;

pub use assistant::{get_status, get_transcript, start_assistant};
pub use health::health_check;
pub use metrics::metrics_handler;
