//! Token provider: exchanges a user id for a short-lived credential.
//!
//! The token endpoint is a trusted backend that signs calling-service
//! credentials. Request: `POST {"userId": "..."}`. Response: `{"token": "..."}`.
//! A response without a (non-empty) token is the fatal
//! [`ClientError::MissingToken`]. There is no retry; the session fails and
//! the participant decides whether to try again.
//!
//! # Security
//!
//! - The credential is held as a `SecretString` and never logged
//! - HTTP timeouts prevent hanging the join flow

use crate::errors::ClientError;
use crate::observability::metrics;
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use common::types::UserId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default connection timeout for the token endpoint.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of calling-service credentials.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch a credential for the given user.
    async fn fetch_token(&self, user_id: &UserId) -> Result<SecretString, ClientError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    user_id: &'a UserId,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<SecretString>,
}

/// Token provider backed by the HTTP token exchange endpoint.
#[derive(Clone)]
pub struct HttpTokenProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl std::fmt::Debug for HttpTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTokenProvider")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpTokenProvider {
    /// Create a provider for the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    #[instrument(skip_all, name = "meeting_client.token.fetch", fields(user_id = %user_id))]
    async fn fetch_token(&self, user_id: &UserId) -> Result<SecretString, ClientError> {
        debug!(
            target: "meeting_client.token",
            endpoint = %self.endpoint,
            "Requesting token"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&TokenRequest { user_id })
            .send()
            .await
            .map_err(|e| {
                warn!(target: "meeting_client.token", error = %e, "Token request failed");
                metrics::record_token_exchange("error");
                ClientError::TokenExchange(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(target: "meeting_client.token", status = %status, "Token endpoint returned an error status");
            metrics::record_token_exchange("error");
            return Err(ClientError::TokenExchange(format!(
                "Token endpoint returned {status}"
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            warn!(target: "meeting_client.token", error = %e, "Failed to parse token response");
            metrics::record_token_exchange("error");
            ClientError::TokenExchange(format!("Invalid token response: {e}"))
        })?;

        match body.token {
            Some(token) if !token.expose_secret().is_empty() => {
                debug!(target: "meeting_client.token", "Token acquired");
                metrics::record_token_exchange("success");
                Ok(token)
            }
            _ => {
                warn!(target: "meeting_client.token", "Token response carried no token");
                metrics::record_token_exchange("missing");
                Err(ClientError::MissingToken)
            }
        }
    }
}
