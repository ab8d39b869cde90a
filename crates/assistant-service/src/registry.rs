//! Per-call assistant records.
//!
//! One record per call id holds whether the call session is live and the
//! transcript collected so far. Launching the assistant again for a call
//! replaces its record; each record carries a generation so an agent run
//! that was replaced can no longer touch the new record.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One transcribed utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLine {
    pub speaker: String,
    pub text: String,
}

/// Public view of a call record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStatus {
    pub is_active: bool,
    pub transcript_lines: usize,
}

#[derive(Debug)]
struct CallRecord {
    generation: u64,
    is_active: bool,
    transcript: Vec<TranscriptLine>,
}

#[derive(Debug, Default)]
struct Inner {
    next_generation: u64,
    calls: HashMap<String, CallRecord>,
}

/// Registry of calls the assistant was launched for.
#[derive(Debug, Default)]
pub struct CallRegistry {
    inner: RwLock<Inner>,
}

impl CallRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh inactive record for `call_id`, replacing any earlier
    /// one. Returns the record's generation.
    pub async fn register(&self, call_id: &str) -> u64 {
        let mut inner = self.inner.write().await;
        inner.next_generation += 1;
        let generation = inner.next_generation;
        inner.calls.insert(
            call_id.to_string(),
            CallRecord {
                generation,
                is_active: false,
                transcript: Vec::new(),
            },
        );
        generation
    }

    /// Mark the call session live or over. Returns false when the record is
    /// gone or belongs to a newer launch.
    pub async fn set_active(&self, call_id: &str, generation: u64, is_active: bool) -> bool {
        let mut inner = self.inner.write().await;
        match inner.calls.get_mut(call_id) {
            Some(record) if record.generation == generation => {
                record.is_active = is_active;
                true
            }
            _ => false,
        }
    }

    /// Append a line and return the whole transcript including it, or
    /// `None` when the record is gone or belongs to a newer launch.
    pub async fn append(
        &self,
        call_id: &str,
        generation: u64,
        line: TranscriptLine,
    ) -> Option<Vec<TranscriptLine>> {
        let mut inner = self.inner.write().await;
        let record = inner
            .calls
            .get_mut(call_id)
            .filter(|record| record.generation == generation)?;
        record.transcript.push(line);
        Some(record.transcript.clone())
    }

    /// Drop the record if it still belongs to `generation`.
    pub async fn remove(&self, call_id: &str, generation: u64) -> bool {
        let mut inner = self.inner.write().await;
        let owned = inner
            .calls
            .get(call_id)
            .is_some_and(|record| record.generation == generation);
        if owned {
            inner.calls.remove(call_id);
        }
        owned
    }

    /// Transcript for `call_id`; empty for unknown calls.
    pub async fn transcript(&self, call_id: &str) -> Vec<TranscriptLine> {
        self.inner
            .read()
            .await
            .calls
            .get(call_id)
            .map(|record| record.transcript.clone())
            .unwrap_or_default()
    }

    pub async fn status(&self, call_id: &str) -> Option<CallStatus> {
        self.inner
            .read()
            .await
            .calls
            .get(call_id)
            .map(|record| CallStatus {
                is_active: record.is_active,
                transcript_lines: record.transcript.len(),
            })
    }

    /// Number of calls whose session is live.
    pub async fn active_count(&self) -> usize {
        self.inner
            .read()
            .await
            .calls
            .values()
            .filter(|record| record.is_active)
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn line(speaker: &str, text: &str) -> TranscriptLine {
        TranscriptLine {
            speaker: speaker.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_unknown_call() {
        let registry = CallRegistry::new();

        assert!(registry.status("nope").await.is_none());
        assert!(registry.transcript("nope").await.is_empty());
        assert!(!registry.set_active("nope", 1, true).await);
        assert!(registry.append("nope", 1, line("a", "b")).await.is_none());
    }

    #[tokio::test]
    async fn test_register_starts_inactive_and_empty() {
        let registry = CallRegistry::new();
        registry.register("standup").await;

        let status = registry.status("standup").await.unwrap();
        assert!(!status.is_active);
        assert_eq!(status.transcript_lines, 0);
    }

    #[tokio::test]
    async fn test_append_returns_full_transcript() {
        let registry = CallRegistry::new();
        let generation = registry.register("standup").await;

        registry
            .append("standup", generation, line("alice", "hello"))
            .await
            .unwrap();
        let transcript = registry
            .append("standup", generation, line("bob", "hi"))
            .await
            .unwrap();

        assert_eq!(transcript, vec![line("alice", "hello"), line("bob", "hi")]);
        assert_eq!(registry.transcript("standup").await, transcript);
    }

    #[tokio::test]
    async fn test_active_toggle_and_count() {
        let registry = CallRegistry::new();
        let a = registry.register("a").await;
        let b = registry.register("b").await;

        assert!(registry.set_active("a", a, true).await);
        assert!(registry.set_active("b", b, true).await);
        assert_eq!(registry.active_count().await, 2);

        assert!(registry.set_active("a", a, false).await);
        assert_eq!(registry.active_count().await, 1);
        assert!(!registry.status("a").await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_relaunch_replaces_record_and_fences_old_generation() {
        let registry = CallRegistry::new();
        let old = registry.register("standup").await;
        registry
            .append("standup", old, line("alice", "before"))
            .await
            .unwrap();

        let new = registry.register("standup").await;
        assert_ne!(old, new);
        assert!(registry.transcript("standup").await.is_empty());

        assert!(registry.append("standup", old, line("x", "late")).await.is_none());
        assert!(!registry.set_active("standup", old, true).await);
        assert!(!registry.remove("standup", old).await);
        assert!(registry.status("standup").await.is_some());

        assert!(registry.remove("standup", new).await);
        assert!(registry.status("standup").await.is_none());
    }
}
