//! Identity and call identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name used when the participant leaves the name field empty.
pub const ANONYMOUS_NAME: &str = "anonymous";

/// Unique identifier for a user on the calling service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a call (meeting) on the calling service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub String);

impl CallId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A participant identity: stable id plus the name shown to others.
///
/// Identities are immutable once a session begins; a different identity
/// means a different connection pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl Identity {
    /// Build an identity with an explicit id.
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    /// Build an identity whose id is derived from the display name.
    ///
    /// The name is trimmed (empty becomes [`ANONYMOUS_NAME`]); the id is the
    /// lowercased name with every whitespace run replaced by one hyphen.
    #[must_use]
    pub fn from_display_name(name: &str) -> Self {
        let trimmed = name.trim();
        let display_name = if trimmed.is_empty() {
            ANONYMOUS_NAME
        } else {
            trimmed
        };

        Self {
            id: derive_user_id(display_name),
            display_name: display_name.to_string(),
        }
    }
}

/// Derive a user id from a display name.
#[must_use]
pub fn derive_user_id(display_name: &str) -> UserId {
    let lowered = display_name.to_lowercase();
    let mut id = String::with_capacity(lowered.len());
    let mut in_whitespace = false;

    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                id.push('-');
            }
            in_whitespace = true;
        } else {
            id.push(c);
            in_whitespace = false;
        }
    }

    UserId(id)
}
