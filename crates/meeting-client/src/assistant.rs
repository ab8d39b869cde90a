//! Backend assistant notification.
//!
//! After a successful join the client asks the backend to attach the
//! meeting assistant to the call: `POST {endpoint}/start-assistant` with
//! `{"call_id": "..."}`. Fire-and-forget; a failure never affects the
//! session.

use crate::errors::ClientError;
use crate::observability::metrics;
use async_trait::async_trait;
use common::types::CallId;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Path of the activation endpoint, relative to the configured base URL.
pub const START_ASSISTANT_PATH: &str = "/start-assistant";

/// Something that can attach the assistant to a call.
#[async_trait]
pub trait AssistantActivation: Send + Sync {
    async fn start_assistant(&self, call_id: &CallId) -> Result<(), ClientError>;
}

#[derive(Serialize)]
struct StartAssistantRequest<'a> {
    call_id: &'a CallId,
}

/// HTTP notifier for the assistant backend.
#[derive(Debug, Clone)]
pub struct HttpAssistantNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpAssistantNotifier {
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}{START_ASSISTANT_PATH}", endpoint.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl AssistantActivation for HttpAssistantNotifier {
    #[instrument(skip_all, name = "meeting_client.assistant.start", fields(call_id = %call_id))]
    async fn start_assistant(&self, call_id: &CallId) -> Result<(), ClientError> {
        let response = self
            .client
            .post(&self.url)
            .json(&StartAssistantRequest { call_id })
            .send()
            .await
            .map_err(|e| ClientError::Assistant(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Assistant(format!(
                "Assistant endpoint returned {status}"
            )));
        }

        debug!(target: "meeting_client.assistant", "Assistant activation accepted");
        Ok(())
    }
}

/// Notify the assistant on a background task. Failures are logged only.
pub fn notify_in_background(
    assistant: Arc<dyn AssistantActivation>,
    call_id: CallId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match assistant.start_assistant(&call_id).await {
            Ok(()) => {
                info!(target: "meeting_client.assistant", call_id = %call_id, "Meeting assistant started");
                metrics::record_assistant_notification("success");
            }
            Err(e) => {
                warn!(
                    target: "meeting_client.assistant",
                    call_id = %call_id,
                    error = %e,
                    "Failed to start meeting assistant"
                );
                metrics::record_assistant_notification("error");
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_start_assistant_posts_call_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/start-assistant"))
            .and(body_json(serde_json::json!({"call_id": "standup-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "message": "Meeting assistant started for call standup-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            HttpAssistantNotifier::new(&format!("{}/", server.uri()), Duration::from_secs(1))
                .unwrap();
        notifier
            .start_assistant(&CallId::from("standup-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let notifier = HttpAssistantNotifier::new(&server.uri(), Duration::from_secs(1)).unwrap();
        let err = notifier
            .start_assistant(&CallId::from("standup-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Assistant(_)));
    }

    #[tokio::test]
    async fn test_background_failure_is_swallowed() {
        // Nothing listens on this port
        let notifier =
            HttpAssistantNotifier::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();

        let handle = notify_in_background(Arc::new(notifier), CallId::from("standup-1"));
        handle.await.expect("background task must not panic");
    }
}
