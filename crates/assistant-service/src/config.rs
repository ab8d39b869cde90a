//! Meeting assistant configuration.
//!
//! Configuration is loaded from environment variables. Nothing here is
//! secret; agent credentials belong to the agent implementation.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Default user id the assistant joins calls as.
pub const DEFAULT_BOT_USER_ID: &str = "meeting-assistant-bot";

/// Default display name for the assistant.
pub const DEFAULT_BOT_NAME: &str = "Meeting Assistant";

/// Default phrase that turns a transcript line into a question.
pub const DEFAULT_TRIGGER_PHRASE: &str = "hey assistant";

/// Upper bound for the shutdown drain period.
pub const MAX_DRAIN_SECONDS: u64 = 300;

/// Meeting assistant configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address (default: "0.0.0.0:8000").
    pub bind_address: String,

    /// User id the assistant joins calls as. Participant events carrying
    /// this id are ignored.
    pub bot_user_id: String,

    /// Display name the assistant joins calls with.
    pub bot_name: String,

    /// Lowercase trigger phrase. Matching is case-insensitive.
    pub trigger_phrase: String,

    /// Seconds to keep serving after a shutdown signal (default: 0).
    pub drain_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid trigger phrase configuration: {0}")]
    InvalidTriggerPhrase(String),

    #[error("Invalid bot identity configuration: {0}")]
    InvalidBotIdentity(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is present but invalid.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("ASSISTANT_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let bot_user_id = vars
            .get("ASSISTANT_BOT_USER_ID")
            .map_or(DEFAULT_BOT_USER_ID, String::as_str)
            .trim()
            .to_string();
        if bot_user_id.is_empty() {
            return Err(ConfigError::InvalidBotIdentity(
                "ASSISTANT_BOT_USER_ID must not be empty".to_string(),
            ));
        }

        let bot_name = vars
            .get("ASSISTANT_BOT_NAME")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BOT_NAME.to_string());

        let trigger_phrase = vars
            .get("ASSISTANT_TRIGGER_PHRASE")
            .map_or(DEFAULT_TRIGGER_PHRASE, String::as_str)
            .trim()
            .to_lowercase();
        if trigger_phrase.is_empty() {
            return Err(ConfigError::InvalidTriggerPhrase(
                "ASSISTANT_TRIGGER_PHRASE must not be empty".to_string(),
            ));
        }

        let drain_seconds = match vars.get("ASSISTANT_DRAIN_SECONDS") {
            Some(value) => {
                let seconds: u64 = value.parse().map_err(|e| {
                    ConfigError::InvalidDrainSeconds(format!(
                        "ASSISTANT_DRAIN_SECONDS must be a non-negative integer, got '{value}': {e}"
                    ))
                })?;
                if seconds > MAX_DRAIN_SECONDS {
                    return Err(ConfigError::InvalidDrainSeconds(format!(
                        "ASSISTANT_DRAIN_SECONDS must be at most {MAX_DRAIN_SECONDS}, got {seconds}"
                    )));
                }
                seconds
            }
            None => 0,
        };

        Ok(Config {
            bind_address,
            bot_user_id,
            bot_name,
            trigger_phrase,
            drain_seconds,
        })
    }
}
