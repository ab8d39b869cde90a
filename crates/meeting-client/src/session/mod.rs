//! Call session lifecycle.
//!
//! [`SessionController`] drives the lifecycle; observers read
//! [`SessionSnapshot`]s through a watch channel and only ever affect the
//! session through `leave()`.

mod controller;
mod state;

pub use controller::{SessionController, SessionServices};
pub use state::{
    EndReason, HandleStatus, LeaveOutcome, SessionHandle, SessionSnapshot, SessionStatus,
};
