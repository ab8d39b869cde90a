//! Meeting client error types.
//!
//! `Display` carries operator-facing context for logs. The text shown to the
//! participant when a session fails comes from [`ClientError::client_message`],
//! which surfaces the underlying failure verbatim.

use crate::config::ConfigError;
use crate::session::SessionStatus;
use thiserror::Error;

/// Failure reported by a remote collaborator (calling service, transport
/// clients). `Display` is the raw upstream message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Meeting client error type.
///
/// Fatal variants (token, connection, create, join) move a session to
/// `Failed`. The remaining variants describe rejected operations or
/// best-effort failures that are only logged.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token exchange request failed.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Token exchange answered without a token.
    #[error("No token returned")]
    MissingToken,

    /// Establishing the transport clients failed.
    #[error("Connection failed: {0}")]
    Connection(RemoteError),

    /// Creating or fetching the call record failed.
    #[error("Call create failed: {0}")]
    CallCreate(RemoteError),

    /// Joining the call failed.
    #[error("Call join failed: {0}")]
    CallJoin(RemoteError),

    /// A leave was requested before the call was joined.
    #[error("Left before the call was joined")]
    LeftBeforeJoin,

    /// The calling service ended the call before the join completed.
    #[error("Call ended before it was joined")]
    EndedBeforeJoin,

    /// The `start` future was dropped before it settled.
    #[error("Session start was cancelled")]
    StartCancelled,

    /// The requested lifecycle transition is not valid from the current state.
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    /// Backend assistant notification failed.
    #[error("Assistant notification failed: {0}")]
    Assistant(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Returns the message shown to the participant.
    ///
    /// Collaborator failures are surfaced exactly as the collaborator
    /// reported them.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            ClientError::TokenExchange(message) | ClientError::Assistant(message) => {
                message.clone()
            }
            ClientError::Connection(e) | ClientError::CallCreate(e) | ClientError::CallJoin(e) => {
                e.message().to_string()
            }
            ClientError::MissingToken
            | ClientError::LeftBeforeJoin
            | ClientError::EndedBeforeJoin
            | ClientError::StartCancelled => self.to_string(),
            ClientError::Config(_)
            | ClientError::InvalidTransition { .. }
            | ClientError::Internal(_) => "Failed to start meeting".to_string(),
        }
    }

    /// Whether this error ends the session in `Failed`.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::TokenExchange(_)
                | ClientError::MissingToken
                | ClientError::Connection(_)
                | ClientError::CallCreate(_)
                | ClientError::CallJoin(_)
                | ClientError::LeftBeforeJoin
                | ClientError::EndedBeforeJoin
                | ClientError::StartCancelled
        )
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}
