//! Mock assistant activation.

use async_trait::async_trait;
use common::types::CallId;
use meeting_client::assistant::AssistantActivation;
use meeting_client::errors::ClientError;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Records every activation request.
#[derive(Debug, Default)]
pub struct MockAssistant {
    error: Option<String>,
    started: Mutex<Vec<CallId>>,
    called: Notify,
}

impl MockAssistant {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every activation.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Call ids the assistant was asked to join.
    pub fn started(&self) -> Vec<CallId> {
        self.started.lock().unwrap().clone()
    }

    /// Resolves once an activation was requested.
    pub async fn called(&self) {
        self.called.notified().await;
    }
}

#[async_trait]
impl AssistantActivation for MockAssistant {
    async fn start_assistant(&self, call_id: &CallId) -> Result<(), ClientError> {
        self.started.lock().unwrap().push(call_id.clone());
        self.called.notify_one();
        match &self.error {
            Some(message) => Err(ClientError::Assistant(message.clone())),
            None => Ok(()),
        }
    }
}
