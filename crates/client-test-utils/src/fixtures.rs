//! Test fixtures for meeting client tests.
//!
//! [`TestHarness`] wires one set of mocks into the session controller the
//! same way `SessionServices::from_config` wires the real collaborators.

use crate::{MockAssistant, MockCallService, MockConnector, MockMediaDevices, MockTokenProvider};
use common::secret::SecretString;
use common::types::{CallId, Identity};
use meeting_client::config::SessionSettings;
use meeting_client::connection::ConnectionManager;
use meeting_client::devices::CapabilityProber;
use meeting_client::remote::Feature;
use meeting_client::session::{SessionController, SessionServices};
use std::sync::Arc;
use uuid::Uuid;

/// Api key used by every harness.
pub const TEST_API_KEY: &str = "test-api-key";

/// Identity derived from the display name "Alice".
#[must_use]
pub fn alice() -> Identity {
    Identity::from_display_name("Alice")
}

/// Identity derived from the display name "Bob Jones".
#[must_use]
pub fn bob() -> Identity {
    Identity::from_display_name("Bob Jones")
}

/// The call id used throughout the scenarios.
#[must_use]
pub fn standup_call() -> CallId {
    CallId::from("standup-1")
}

/// A unique call id.
#[must_use]
pub fn random_call() -> CallId {
    CallId(format!("call-{}", Uuid::new_v4()))
}

/// Session settings with the given feature set.
#[must_use]
pub fn settings_with(features: &[Feature]) -> SessionSettings {
    SessionSettings {
        features: features.to_vec(),
        ..SessionSettings::default()
    }
}

/// Mocks plus the shared connection manager.
pub struct TestHarness {
    pub calls: Arc<MockCallService>,
    pub connector: Arc<MockConnector>,
    pub devices: Arc<MockMediaDevices>,
    pub tokens: Arc<MockTokenProvider>,
    pub assistant: Arc<MockAssistant>,
    pub connections: Arc<ConnectionManager>,
    pub settings: SessionSettings,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Everything succeeds; both devices available; transcription on.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// The services a controller is built from.
    #[must_use]
    pub fn services(&self) -> SessionServices {
        SessionServices {
            tokens: self.tokens.clone(),
            connections: Arc::clone(&self.connections),
            prober: CapabilityProber::new(self.devices.clone()),
            assistant: Some(self.assistant.clone()),
        }
    }

    /// A fresh controller over the harness mocks.
    #[must_use]
    pub fn controller(&self) -> SessionController {
        SessionController::new(self.settings.clone(), self.services())
    }
}

/// Builder for [`TestHarness`].
#[derive(Default)]
pub struct TestHarnessBuilder {
    calls: Option<MockCallService>,
    connector: Option<Box<dyn FnOnce(Arc<MockCallService>) -> MockConnector>>,
    devices: Option<MockMediaDevices>,
    tokens: Option<MockTokenProvider>,
    assistant: Option<MockAssistant>,
    features: Option<Vec<Feature>>,
}

impl TestHarnessBuilder {
    #[must_use]
    pub fn calls(mut self, calls: MockCallService) -> Self {
        self.calls = Some(calls);
        self
    }

    /// Customize the connector; receives the harness call service.
    #[must_use]
    pub fn connector(
        mut self,
        build: impl FnOnce(Arc<MockCallService>) -> MockConnector + 'static,
    ) -> Self {
        self.connector = Some(Box::new(build));
        self
    }

    #[must_use]
    pub fn devices(mut self, devices: MockMediaDevices) -> Self {
        self.devices = Some(devices);
        self
    }

    #[must_use]
    pub fn tokens(mut self, tokens: MockTokenProvider) -> Self {
        self.tokens = Some(tokens);
        self
    }

    #[must_use]
    pub fn assistant(mut self, assistant: MockAssistant) -> Self {
        self.assistant = Some(assistant);
        self
    }

    #[must_use]
    pub fn features(mut self, features: &[Feature]) -> Self {
        self.features = Some(features.to_vec());
        self
    }

    #[must_use]
    pub fn build(self) -> TestHarness {
        let calls = Arc::new(self.calls.unwrap_or_default());
        let connector = Arc::new(match self.connector {
            Some(build) => build(Arc::clone(&calls)),
            None => MockConnector::new(calls.clone()),
        });
        let connections = Arc::new(ConnectionManager::new(
            SecretString::from(TEST_API_KEY),
            connector.clone(),
        ));

        TestHarness {
            calls,
            connector,
            devices: Arc::new(self.devices.unwrap_or_else(MockMediaDevices::all)),
            tokens: Arc::new(self.tokens.unwrap_or_default()),
            assistant: Arc::new(self.assistant.unwrap_or_default()),
            connections,
            settings: self
                .features
                .map_or_else(SessionSettings::default, |f| settings_with(&f)),
        }
    }
}
