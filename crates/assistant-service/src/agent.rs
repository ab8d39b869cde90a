//! The realtime agent seam.
//!
//! A [`MeetingAgent`] joins a call as the assistant bot, streams what
//! happens in the call back as [`AgentEvent`]s, and speaks answers. The
//! realtime model and edge transport live behind this trait; the shipped
//! binary wires in [`LoggingAgent`].

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::info;

/// Buffered events per call before the agent applies backpressure.
pub const EVENT_BUFFER: usize = 64;

/// Who the assistant joins calls as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
    pub name: String,
}

/// Something the agent observed in a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    SessionStarted,
    SessionEnded,
    ParticipantJoined { user_id: String, name: String },
    ParticipantLeft { user_id: String, name: String },
    /// One speech transcription. `speaker` is absent when the agent could
    /// not attribute the line.
    Transcript {
        speaker: Option<String>,
        text: String,
    },
    /// A streamed piece of a spoken answer.
    ResponseChunk { delta: String },
    /// A plugin inside the agent failed without ending the session.
    PluginError { message: String },
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent failed to join call: {0}")]
    Join(String),

    #[error("Agent failed to respond: {0}")]
    Response(String),
}

/// Realtime meeting agent.
#[async_trait]
pub trait MeetingAgent: Send + Sync {
    /// Join `call_id` as `bot`. The returned stream closes when the agent
    /// is finished with the call.
    async fn join(
        &self,
        call_id: &str,
        bot: &BotIdentity,
    ) -> Result<mpsc::Receiver<AgentEvent>, AgentError>;

    /// Speak a short answer to `prompt` in `call_id`.
    async fn respond(&self, call_id: &str, prompt: &str) -> Result<(), AgentError>;
}

/// Agent that logs instead of talking to a realtime model.
///
/// Each joined call reports `SessionStarted` and stays open until the call
/// is joined again or the process exits.
#[derive(Debug, Default)]
pub struct LoggingAgent {
    sessions: Mutex<HashMap<String, mpsc::Sender<AgentEvent>>>,
}

impl LoggingAgent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeetingAgent for LoggingAgent {
    async fn join(
        &self,
        call_id: &str,
        bot: &BotIdentity,
    ) -> Result<mpsc::Receiver<AgentEvent>, AgentError> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tx.send(AgentEvent::SessionStarted)
            .await
            .map_err(|e| AgentError::Join(e.to_string()))?;

        info!(
            target: "assistant.agent",
            call_id = %call_id,
            bot_user_id = %bot.user_id,
            "Logging agent joined call"
        );

        // Replacing the sender closes the previous stream for this call
        self.sessions.lock().await.insert(call_id.to_string(), tx);
        Ok(rx)
    }

    async fn respond(&self, call_id: &str, prompt: &str) -> Result<(), AgentError> {
        info!(
            target: "assistant.agent",
            call_id = %call_id,
            prompt_len = prompt.len(),
            "Logging agent asked to respond"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn bot() -> BotIdentity {
        BotIdentity {
            user_id: "meeting-assistant-bot".to_string(),
            name: "Meeting Assistant".to_string(),
        }
    }

    #[tokio::test]
    async fn test_logging_agent_reports_session_started() {
        let agent = LoggingAgent::new();
        let mut events = agent.join("standup", &bot()).await.unwrap();

        assert_eq!(events.recv().await, Some(AgentEvent::SessionStarted));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_logging_agent_rejoin_closes_previous_stream() {
        let agent = LoggingAgent::new();
        let mut first = agent.join("standup", &bot()).await.unwrap();
        let _second = agent.join("standup", &bot()).await.unwrap();

        assert_eq!(first.recv().await, Some(AgentEvent::SessionStarted));
        assert_eq!(first.recv().await, None);
    }

    #[tokio::test]
    async fn test_logging_agent_respond_succeeds() {
        let agent = LoggingAgent::new();
        agent.respond("standup", "prompt").await.unwrap();
    }
}
