//! # Meeting Client Test Utilities
//!
//! Recording mocks for every collaborator seam of the meeting client, plus
//! fixtures that wire them into a ready-to-use session controller.
//!
//! ## Modules
//!
//! - `mock_call_service` - Remote calling service with an ordered call log
//! - `mock_transport` - Transport connector and video/chat clients
//! - `mock_devices` - Camera/microphone access
//! - `mock_token` - Token provider
//! - `mock_assistant` - Backend assistant activation
//! - `fixtures` - Identities, call ids and the `TestHarness`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use client_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let harness = TestHarness::new();
//!     let controller = harness.controller();
//!
//!     controller.start(standup_call(), alice()).await.unwrap();
//!
//!     assert!(harness.calls.ops().contains(&CallOp::Join { create: true }));
//! }
//! ```

pub mod fixtures;
pub mod mock_assistant;
pub mod mock_call_service;
pub mod mock_devices;
pub mod mock_token;
pub mod mock_transport;

pub use fixtures::{alice, bob, random_call, settings_with, standup_call, TestHarness};
pub use mock_assistant::MockAssistant;
pub use mock_call_service::{CallOp, MockCallService};
pub use mock_devices::MockMediaDevices;
pub use mock_token::MockTokenProvider;
pub use mock_transport::{MockChatClient, MockConnector, MockVideoClient};
