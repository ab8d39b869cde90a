//! Common utilities and types shared across the meeting client workspace.

#![warn(clippy::pedantic)]

/// Module for identity and call identifier types
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;
