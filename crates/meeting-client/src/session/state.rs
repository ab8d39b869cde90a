//! Session lifecycle states and the transition table.

use crate::devices::CapabilitySummary;
use crate::errors::ClientError;
use crate::remote::Feature;
use common::types::CallId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Authenticating,
    Connecting,
    Probing,
    Creating,
    Joining,
    ActivatingFeatures,
    Joined,
    Ending,
    Ended,
    Failed,
}

impl SessionStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Authenticating => "authenticating",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Probing => "probing",
            SessionStatus::Creating => "creating",
            SessionStatus::Joining => "joining",
            SessionStatus::ActivatingFeatures => "activating_features",
            SessionStatus::Joined => "joined",
            SessionStatus::Ending => "ending",
            SessionStatus::Ended => "ended",
            SessionStatus::Failed => "failed",
        }
    }

    /// Between `start` and `Joined`.
    #[must_use]
    pub const fn is_starting(&self) -> bool {
        matches!(
            self,
            SessionStatus::Authenticating
                | SessionStatus::Connecting
                | SessionStatus::Probing
                | SessionStatus::Creating
                | SessionStatus::Joining
                | SessionStatus::ActivatingFeatures
        )
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Ended | SessionStatus::Failed)
    }

    /// Whether `next` may follow `self`.
    #[must_use]
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::{
            ActivatingFeatures, Authenticating, Connecting, Creating, Ended, Ending, Failed,
            Idle, Joined, Joining, Probing,
        };

        match (self, next) {
            (Idle, Authenticating)
            | (Authenticating, Connecting)
            | (Connecting, Probing)
            | (Probing, Creating)
            | (Creating, Joining)
            | (Joining, ActivatingFeatures)
            | (ActivatingFeatures, Joined)
            | (Joined, Ending)
            | (Ending, Ended) => true,
            (from, Failed) => from.is_starting(),
            _ => false,
        }
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidTransition` when `next` may not follow.
    pub fn transition(self, next: SessionStatus) -> Result<SessionStatus, ClientError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ClientError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Coarse status reported on the [`SessionHandle`].
    #[must_use]
    pub const fn handle_status(&self) -> HandleStatus {
        match self {
            SessionStatus::Joined => HandleStatus::Joined,
            SessionStatus::Ending | SessionStatus::Ended => HandleStatus::Ended,
            SessionStatus::Failed => HandleStatus::Failed,
            _ => HandleStatus::Initializing,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a [`SessionHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleStatus {
    Initializing,
    Joined,
    Ended,
    Failed,
}

/// The participant's view of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHandle {
    pub call_id: CallId,
    pub status: HandleStatus,
    pub features_active: BTreeSet<Feature>,
}

/// Why a joined session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The participant called `leave`.
    LocalLeave,
    /// The calling service reported the session ended.
    RemoteEnded,
    /// The controller was dropped while joined, or `start` was dropped
    /// mid-flight.
    Teardown,
    /// A leave arrived after the join returned but before `Joined`.
    StartAborted,
}

impl EndReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EndReason::LocalLeave => "local_leave",
            EndReason::RemoteEnded => "remote_ended",
            EndReason::Teardown => "teardown",
            EndReason::StartAborted => "start_aborted",
        }
    }
}

/// What a `leave` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// `start` was never called; nothing to do.
    NotStarted,
    /// This call ran the cleanup.
    Left,
    /// The in-flight start was aborted.
    AbortedStart,
    /// Another trigger already ended the session (or it failed).
    AlreadyEnded,
}

/// Observable controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub call_id: Option<CallId>,
    pub features_active: BTreeSet<Feature>,
    pub capabilities: Option<CapabilitySummary>,
    /// Participant-facing failure message once `Failed`.
    pub error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            call_id: None,
            features_active: BTreeSet::new(),
            capabilities: None,
            error: None,
        }
    }
}

impl SessionSnapshot {
    /// The handle, once `start` has named a call.
    #[must_use]
    pub fn handle(&self) -> Option<SessionHandle> {
        self.call_id.as_ref().map(|call_id| SessionHandle {
            call_id: call_id.clone(),
            status: self.status.handle_status(),
            features_active: self.features_active.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const HAPPY_PATH: [SessionStatus; 10] = [
        SessionStatus::Idle,
        SessionStatus::Authenticating,
        SessionStatus::Connecting,
        SessionStatus::Probing,
        SessionStatus::Creating,
        SessionStatus::Joining,
        SessionStatus::ActivatingFeatures,
        SessionStatus::Joined,
        SessionStatus::Ending,
        SessionStatus::Ended,
    ];

    #[test]
    fn test_happy_path_is_valid() {
        for pair in HAPPY_PATH.windows(2) {
            let [from, to] = pair else { unreachable!() };
            assert!(from.can_transition_to(*to), "{from} -> {to}");
        }
    }

    #[test]
    fn test_failed_only_reachable_before_joined() {
        for status in HAPPY_PATH {
            let expected = status.is_starting();
            assert_eq!(status.can_transition_to(SessionStatus::Failed), expected, "{status}");
        }
        assert!(!SessionStatus::Failed.can_transition_to(SessionStatus::Failed));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [SessionStatus::Ended, SessionStatus::Failed] {
            for next in HAPPY_PATH {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_restart_rejected() {
        let err = SessionStatus::Joined
            .transition(SessionStatus::Authenticating)
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidTransition {
                from: SessionStatus::Joined,
                to: SessionStatus::Authenticating
            }
        ));
    }

    #[test]
    fn test_no_skipping_steps() {
        assert!(!SessionStatus::Creating.can_transition_to(SessionStatus::Joined));
        assert!(!SessionStatus::Idle.can_transition_to(SessionStatus::Joining));
        assert!(!SessionStatus::Joined.can_transition_to(SessionStatus::Ended));
    }

    #[test]
    fn test_handle_status_mapping() {
        assert_eq!(SessionStatus::Creating.handle_status(), HandleStatus::Initializing);
        assert_eq!(SessionStatus::Joined.handle_status(), HandleStatus::Joined);
        assert_eq!(SessionStatus::Ending.handle_status(), HandleStatus::Ended);
        assert_eq!(SessionStatus::Failed.handle_status(), HandleStatus::Failed);
    }

    #[test]
    fn test_snapshot_without_call_has_no_handle() {
        assert!(SessionSnapshot::default().handle().is_none());
    }
}
