//! Realtime client connection manager.
//!
//! Owns the two long-lived transport clients (video, chat) for one
//! identity/credential pair. A pair is only ever exposed once both legs are
//! connected; a half-connected pair is released before the error surfaces.
//!
//! Connecting with the same identity and credential reuses the live pair.
//! Connecting with a different one first releases the old pair. All
//! operations are serialized on the manager's lock, so two racing connects
//! never build two pairs.

use crate::errors::{ClientError, RemoteError};
use crate::observability::metrics;
use crate::remote::CallService;
use async_trait::async_trait;
use common::secret::{same_secret, SecretString};
use common::types::Identity;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Video transport client for one user.
#[async_trait]
pub trait VideoClient: Send + Sync {
    /// Calling service operations bound to this client.
    fn calls(&self) -> Arc<dyn CallService>;

    async fn disconnect_user(&self) -> Result<(), RemoteError>;
}

/// Chat transport client for one user.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn disconnect_user(&self) -> Result<(), RemoteError>;
}

/// Establishes transport clients.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect_video(
        &self,
        api_key: &SecretString,
        identity: &Identity,
        credential: &SecretString,
    ) -> Result<Arc<dyn VideoClient>, RemoteError>;

    async fn connect_chat(
        &self,
        api_key: &SecretString,
        identity: &Identity,
        credential: &SecretString,
    ) -> Result<Arc<dyn ChatClient>, RemoteError>;
}

/// Both transport clients, connected.
#[derive(Clone)]
pub struct ConnectionPair {
    video: Arc<dyn VideoClient>,
    chat: Arc<dyn ChatClient>,
}

impl ConnectionPair {
    #[must_use]
    pub fn video(&self) -> &Arc<dyn VideoClient> {
        &self.video
    }

    #[must_use]
    pub fn chat(&self) -> &Arc<dyn ChatClient> {
        &self.chat
    }
}

impl fmt::Debug for ConnectionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPair").finish_non_exhaustive()
    }
}

struct LivePair {
    identity: Identity,
    credential: SecretString,
    pair: ConnectionPair,
}

/// Shared owner of the live [`ConnectionPair`].
pub struct ConnectionManager {
    api_key: SecretString,
    connector: Arc<dyn TransportConnector>,
    live: Mutex<Option<LivePair>>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    #[must_use]
    pub fn new(api_key: SecretString, connector: Arc<dyn TransportConnector>) -> Self {
        Self {
            api_key,
            connector,
            live: Mutex::new(None),
        }
    }

    /// Get a connected pair for the given identity and credential.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` with the collaborator's message if
    /// either leg fails. The manager is left without a pair in that case.
    #[instrument(skip_all, name = "meeting_client.connection.connect", fields(user_id = %identity.id))]
    pub async fn connect(
        &self,
        identity: &Identity,
        credential: SecretString,
    ) -> Result<ConnectionPair, ClientError> {
        let mut live = self.live.lock().await;

        if let Some(current) = live.as_ref() {
            if current.identity == *identity && same_secret(&current.credential, &credential) {
                debug!(target: "meeting_client.connection", "Reusing live connection pair");
                metrics::record_connection("reused");
                return Ok(current.pair.clone());
            }
        }

        if let Some(previous) = live.take() {
            info!(
                target: "meeting_client.connection",
                previous_user_id = %previous.identity.id,
                "Identity or credential changed, releasing previous connection pair"
            );
            release(&previous.pair).await;
        }

        let (video, chat) = tokio::join!(
            self.connector
                .connect_video(&self.api_key, identity, &credential),
            self.connector
                .connect_chat(&self.api_key, identity, &credential),
        );

        let pair = match (video, chat) {
            (Ok(video), Ok(chat)) => ConnectionPair { video, chat },
            (Ok(video), Err(e)) => {
                warn!(target: "meeting_client.connection", error = %e, "Chat client failed to connect");
                disconnect_leg("video", video.disconnect_user().await);
                metrics::record_connection("error");
                return Err(ClientError::Connection(e));
            }
            (Err(e), Ok(chat)) => {
                warn!(target: "meeting_client.connection", error = %e, "Video client failed to connect");
                disconnect_leg("chat", chat.disconnect_user().await);
                metrics::record_connection("error");
                return Err(ClientError::Connection(e));
            }
            (Err(e), Err(chat_error)) => {
                warn!(
                    target: "meeting_client.connection",
                    error = %e,
                    chat_error = %chat_error,
                    "Both transport clients failed to connect"
                );
                metrics::record_connection("error");
                return Err(ClientError::Connection(e));
            }
        };

        info!(target: "meeting_client.connection", "Connection pair established");
        metrics::record_connection("connected");

        *live = Some(LivePair {
            identity: identity.clone(),
            credential,
            pair: pair.clone(),
        });

        Ok(pair)
    }

    /// The live pair, if any.
    pub async fn current(&self) -> Option<ConnectionPair> {
        self.live.lock().await.as_ref().map(|l| l.pair.clone())
    }

    /// Release the live pair. Safe to call any number of times.
    #[instrument(skip_all, name = "meeting_client.connection.disconnect")]
    pub async fn disconnect(&self) {
        let previous = self.live.lock().await.take();
        match previous {
            Some(previous) => {
                release(&previous.pair).await;
                info!(
                    target: "meeting_client.connection",
                    user_id = %previous.identity.id,
                    "Connection pair released"
                );
            }
            None => debug!(target: "meeting_client.connection", "No live connection pair"),
        }
    }
}

/// Disconnect both legs; errors are logged.
async fn release(pair: &ConnectionPair) {
    let (video, chat) = tokio::join!(pair.video.disconnect_user(), pair.chat.disconnect_user());
    disconnect_leg("video", video);
    disconnect_leg("chat", chat);
}

fn disconnect_leg(leg: &'static str, result: Result<(), RemoteError>) {
    if let Err(e) = result {
        warn!(target: "meeting_client.connection", leg, error = %e, "Disconnect failed");
    }
}
