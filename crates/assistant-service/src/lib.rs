//! Meeting assistant library.
//!
//! The assistant joins a call as a bot through a [`agent::MeetingAgent`],
//! keeps a transcript per call, and answers questions that start with the
//! trigger phrase using only that transcript.
//!
//! # Architecture
//!
//! - [`routes`] exposes `POST /start-assistant`, `GET /transcript/:call_id`,
//!   `GET /status/:call_id`, `/health` and `/metrics`
//! - [`runner`] drives one agent run per launch in the background
//! - [`registry`] holds the per-call records the handlers read
//! - [`prompt`] detects triggers and builds answer prompts

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod agent;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod prompt;
pub mod registry;
pub mod routes;
pub mod runner;
