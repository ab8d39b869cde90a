//! Drives one agent run for one call.
//!
//! The runner joins the call through the [`MeetingAgent`], then folds every
//! event into the [`CallRegistry`] record it was launched with until the
//! agent closes the stream. A triggered question is answered inline, so
//! transcript lines that arrive while the agent is speaking queue up behind
//! the answer.

use crate::agent::{AgentEvent, BotIdentity, MeetingAgent};
use crate::observability::metrics;
use crate::prompt::{build_prompt, extract_question};
use crate::registry::{CallRegistry, TranscriptLine};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Speaker recorded for lines the agent could not attribute.
pub const UNKNOWN_SPEAKER: &str = "Unknown";

/// Everything one run needs.
#[derive(Clone)]
pub struct AssistantRunner {
    pub agent: Arc<dyn MeetingAgent>,
    pub registry: Arc<CallRegistry>,
    pub bot: BotIdentity,
    pub trigger_phrase: String,
}

impl AssistantRunner {
    /// Register a fresh record for `call_id` and run the agent in the
    /// background. Returns the record's generation.
    pub async fn launch(&self, call_id: &str) -> u64 {
        let generation = self.registry.register(call_id).await;
        let runner = self.clone();
        let call_id = call_id.to_string();
        tokio::spawn(async move { runner.run(call_id, generation).await });
        generation
    }

    /// Join the call and process events until the agent finishes.
    ///
    /// A failed join is logged and removes the record.
    #[instrument(skip_all, name = "assistant.run", fields(call_id = %call_id, generation = generation))]
    pub async fn run(&self, call_id: String, generation: u64) {
        info!(target: "assistant.runner", "Starting meeting assistant");

        let mut events = match self.agent.join(&call_id, &self.bot).await {
            Ok(events) => events,
            Err(e) => {
                error!(target: "assistant.runner", error = %e, "Error starting agent");
                metrics::record_launch("error");
                self.registry.remove(&call_id, generation).await;
                return;
            }
        };

        metrics::record_launch("success");
        info!(target: "assistant.runner", "Assistant active");

        while let Some(event) = events.recv().await {
            self.handle_event(&call_id, generation, event).await;
        }

        info!(target: "assistant.runner", "Agent finished");
    }

    async fn handle_event(&self, call_id: &str, generation: u64, event: AgentEvent) {
        match event {
            AgentEvent::SessionStarted => {
                self.set_active(call_id, generation, true).await;
                info!(target: "assistant.runner", "Meeting started");
            }
            AgentEvent::SessionEnded => {
                self.set_active(call_id, generation, false).await;
                info!(target: "assistant.runner", "Meeting ended");
            }
            AgentEvent::ParticipantJoined { user_id, name } => {
                if user_id != self.bot.user_id {
                    info!(target: "assistant.runner", participant = %name, "Participant joined");
                }
            }
            AgentEvent::ParticipantLeft { user_id, name } => {
                if user_id != self.bot.user_id {
                    info!(target: "assistant.runner", participant = %name, "Participant left");
                }
            }
            AgentEvent::Transcript { speaker, text } => {
                self.handle_transcript(call_id, generation, speaker, &text)
                    .await;
            }
            AgentEvent::ResponseChunk { delta } => {
                if !delta.is_empty() {
                    debug!(target: "assistant.runner", delta = %delta, "Answer chunk");
                }
            }
            AgentEvent::PluginError { message } => {
                error!(target: "assistant.runner", error = %message, "Agent plugin error");
            }
        }
    }

    async fn handle_transcript(
        &self,
        call_id: &str,
        generation: u64,
        speaker: Option<String>,
        text: &str,
    ) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let line = TranscriptLine {
            speaker: speaker.unwrap_or_else(|| UNKNOWN_SPEAKER.to_string()),
            text: text.to_string(),
        };
        debug!(target: "assistant.runner", speaker = %line.speaker, "Transcript line");

        let Some(transcript) = self.registry.append(call_id, generation, line).await else {
            warn!(target: "assistant.runner", "Call record replaced, dropping transcript line");
            return;
        };
        metrics::record_transcript_line();

        let Some(question) = extract_question(text, &self.trigger_phrase) else {
            return;
        };

        let prompt = build_prompt(&transcript, question);
        let started = Instant::now();
        match self.agent.respond(call_id, &prompt).await {
            Ok(()) => {
                metrics::record_answer("success", started.elapsed());
                info!(target: "assistant.runner", "Answered triggered question");
            }
            Err(e) => {
                metrics::record_answer("error", started.elapsed());
                error!(target: "assistant.runner", error = %e, "Failed to answer question");
            }
        }
    }

    async fn set_active(&self, call_id: &str, generation: u64, is_active: bool) {
        if self.registry.set_active(call_id, generation, is_active).await {
            metrics::set_active_calls(self.registry.active_count().await);
        }
    }
}
