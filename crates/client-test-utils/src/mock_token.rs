//! Mock token provider.

use async_trait::async_trait;
use common::secret::SecretString;
use common::types::UserId;
use meeting_client::errors::ClientError;
use meeting_client::token::TokenProvider;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

enum TokenBehavior {
    /// Issue `{prefix}-{user_id}`.
    Issue(String),
    /// Answer without a token.
    Missing,
    /// Fail the exchange with a message.
    Fail(String),
}

/// Mock token provider.
pub struct MockTokenProvider {
    behavior: Mutex<TokenBehavior>,
    requests: Mutex<Vec<UserId>>,
    gate: Option<Arc<Notify>>,
    entered: Notify,
}

impl Default for MockTokenProvider {
    fn default() -> Self {
        Self::issuing("token")
    }
}

impl MockTokenProvider {
    /// Issue `{prefix}-{user_id}` for every request.
    #[must_use]
    pub fn issuing(prefix: impl Into<String>) -> Self {
        Self {
            behavior: Mutex::new(TokenBehavior::Issue(prefix.into())),
            requests: Mutex::new(Vec::new()),
            gate: None,
            entered: Notify::new(),
        }
    }

    /// Answer without a token (`No token returned`).
    #[must_use]
    pub fn missing() -> Self {
        Self {
            behavior: Mutex::new(TokenBehavior::Missing),
            requests: Mutex::new(Vec::new()),
            gate: None,
            entered: Notify::new(),
        }
    }

    /// Fail every exchange with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behavior: Mutex::new(TokenBehavior::Fail(message.into())),
            requests: Mutex::new(Vec::new()),
            gate: None,
            entered: Notify::new(),
        }
    }

    /// Block every exchange until [`MockTokenProvider::release`] is called.
    #[must_use]
    pub fn hold(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Let one held exchange proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Resolves once an exchange has been entered.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Switch to issuing tokens with a new prefix (simulates rotation).
    pub fn rotate(&self, prefix: impl Into<String>) {
        *self.behavior.lock().unwrap() = TokenBehavior::Issue(prefix.into());
    }

    /// User ids requested so far.
    pub fn requests(&self) -> Vec<UserId> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn fetch_token(&self, user_id: &UserId) -> Result<SecretString, ClientError> {
        self.requests.lock().unwrap().push(user_id.clone());
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &*self.behavior.lock().unwrap() {
            TokenBehavior::Issue(prefix) => Ok(SecretString::from(format!("{prefix}-{user_id}"))),
            TokenBehavior::Missing => Err(ClientError::MissingToken),
            TokenBehavior::Fail(message) => Err(ClientError::TokenExchange(message.clone())),
        }
    }
}
