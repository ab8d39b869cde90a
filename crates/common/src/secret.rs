//! Secret types for protecting credentials from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for every sensitive value in the
//! workspace: the calling service API key and the short-lived user
//! credentials handed out by the token exchange endpoint.
//!
//! `SecretString` redacts itself in `Debug`, so a struct that derives `Debug`
//! and holds a credential can be logged through `tracing` without leaking it.
//! The value is zeroized on drop.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Session {
//!     user_id: String,
//!     credential: SecretString,
//! }
//!
//! let session = Session {
//!     user_id: "alice".to_string(),
//!     credential: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! // Debug output keeps the user id and hides the credential
//! println!("{session:?}");
//!
//! // Reading the value requires an explicit call
//! let raw: &str = session.credential.expose_secret();
//! ```

pub use secrecy::{ExposeSecret, SecretString};

/// Compare two secrets without exposing either outside this function.
///
/// Used to decide whether a credential changed between two connection
/// requests.
#[must_use]
pub fn same_secret(a: &SecretString, b: &SecretString) -> bool {
    a.expose_secret() == b.expose_secret()
}
