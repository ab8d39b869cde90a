//! Meeting client
//!
//! Joins a participant to an AI-assisted video meeting and tears the session
//! down cleanly.
//!
//! # Architecture
//!
//! - [`token`]: exchanges a user id for a short-lived credential
//! - [`connection`]: owns the video and chat transport clients for one
//!   identity/credential pair
//! - [`devices`]: best-effort camera/microphone probe
//! - [`session`]: the lifecycle controller (authenticate, connect, probe,
//!   create, join, activate features, exactly-once cleanup)
//! - [`assistant`]: fire-and-forget backend assistant activation
//! - [`remote`]: the calling service contract the controller drives
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let services = SessionServices::from_config(&config, connector, devices)?;
//!
//! let controller = SessionController::new(config.session_settings(), services);
//! let identity = Identity::from_display_name("Alice");
//! let handle = controller.start(CallId::from("standup-1"), identity).await?;
//! // ...
//! controller.leave().await;
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod assistant;
pub mod config;
pub mod connection;
pub mod devices;
pub mod errors;
pub mod observability;
pub mod remote;
pub mod session;
pub mod token;

pub use config::{ClientConfig, SessionSettings};
pub use errors::{ClientError, RemoteError};
pub use session::{SessionController, SessionServices};
