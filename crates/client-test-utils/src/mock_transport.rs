//! Mock transport connector and clients.
//!
//! Every connected client is kept so tests can check which legs were
//! disconnected after a failure or an identity change.

use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use common::types::Identity;
use meeting_client::connection::{ChatClient, TransportConnector, VideoClient};
use meeting_client::errors::RemoteError;
use meeting_client::remote::CallService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock video client.
pub struct MockVideoClient {
    identity: Identity,
    calls: Arc<dyn CallService>,
    disconnects: AtomicUsize,
}

impl MockVideoClient {
    /// The identity this client was connected with.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Number of `disconnect_user` calls.
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoClient for MockVideoClient {
    fn calls(&self) -> Arc<dyn CallService> {
        Arc::clone(&self.calls)
    }

    async fn disconnect_user(&self) -> Result<(), RemoteError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock chat client.
#[derive(Debug)]
pub struct MockChatClient {
    identity: Identity,
    disconnects: AtomicUsize,
    disconnect_error: Option<String>,
}

impl MockChatClient {
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn disconnect_user(&self) -> Result<(), RemoteError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        match &self.disconnect_error {
            Some(message) => Err(RemoteError::new(message.clone())),
            None => Ok(()),
        }
    }
}

/// Mock transport connector.
pub struct MockConnector {
    calls: Arc<dyn CallService>,
    video_error: Mutex<Option<String>>,
    chat_error: Mutex<Option<String>>,
    chat_disconnect_error: Option<String>,
    api_keys: Mutex<Vec<String>>,
    credentials: Mutex<Vec<String>>,
    videos: Mutex<Vec<Arc<MockVideoClient>>>,
    chats: Mutex<Vec<Arc<MockChatClient>>>,
}

impl MockConnector {
    /// Connector whose video clients hand out `calls`.
    #[must_use]
    pub fn new(calls: Arc<dyn CallService>) -> Self {
        Self {
            calls,
            video_error: Mutex::new(None),
            chat_error: Mutex::new(None),
            chat_disconnect_error: None,
            api_keys: Mutex::new(Vec::new()),
            credentials: Mutex::new(Vec::new()),
            videos: Mutex::new(Vec::new()),
            chats: Mutex::new(Vec::new()),
        }
    }

    /// Fail the video leg with the given message.
    #[must_use]
    pub fn fail_video(self, message: impl Into<String>) -> Self {
        *self.video_error.lock().unwrap() = Some(message.into());
        self
    }

    /// Fail the chat leg with the given message.
    #[must_use]
    pub fn fail_chat(self, message: impl Into<String>) -> Self {
        *self.chat_error.lock().unwrap() = Some(message.into());
        self
    }

    /// Make chat disconnects fail.
    #[must_use]
    pub fn fail_chat_disconnect(mut self, message: impl Into<String>) -> Self {
        self.chat_disconnect_error = Some(message.into());
        self
    }

    /// Clear configured connect failures.
    pub fn heal(&self) {
        *self.video_error.lock().unwrap() = None;
        *self.chat_error.lock().unwrap() = None;
    }

    /// Every video client connected so far.
    pub fn videos(&self) -> Vec<Arc<MockVideoClient>> {
        self.videos.lock().unwrap().clone()
    }

    /// Every chat client connected so far.
    pub fn chats(&self) -> Vec<Arc<MockChatClient>> {
        self.chats.lock().unwrap().clone()
    }

    /// Number of video connect attempts.
    pub fn video_connects(&self) -> usize {
        self.credentials.lock().unwrap().len()
    }

    /// Credentials presented on video connect, exposed for assertions.
    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }

    /// Api keys presented on video connect.
    pub fn api_keys(&self) -> Vec<String> {
        self.api_keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportConnector for MockConnector {
    async fn connect_video(
        &self,
        api_key: &SecretString,
        identity: &Identity,
        credential: &SecretString,
    ) -> Result<Arc<dyn VideoClient>, RemoteError> {
        self.api_keys
            .lock()
            .unwrap()
            .push(api_key.expose_secret().to_string());
        self.credentials
            .lock()
            .unwrap()
            .push(credential.expose_secret().to_string());

        if let Some(message) = self.video_error.lock().unwrap().clone() {
            return Err(RemoteError::new(message));
        }

        let client = Arc::new(MockVideoClient {
            identity: identity.clone(),
            calls: Arc::clone(&self.calls),
            disconnects: AtomicUsize::new(0),
        });
        self.videos.lock().unwrap().push(Arc::clone(&client));
        Ok(client)
    }

    async fn connect_chat(
        &self,
        _api_key: &SecretString,
        identity: &Identity,
        _credential: &SecretString,
    ) -> Result<Arc<dyn ChatClient>, RemoteError> {
        if let Some(message) = self.chat_error.lock().unwrap().clone() {
            return Err(RemoteError::new(message));
        }

        let client = Arc::new(MockChatClient {
            identity: identity.clone(),
            disconnects: AtomicUsize::new(0),
            disconnect_error: self.chat_disconnect_error.clone(),
        });
        self.chats.lock().unwrap().push(Arc::clone(&client));
        Ok(client)
    }
}
