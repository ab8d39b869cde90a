//! Meeting client configuration.
//!
//! Configuration is loaded from environment variables and injected into the
//! session controller at construction. The api key is redacted in Debug
//! output.

use crate::remote::{Feature, DEFAULT_CALL_TYPE};
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default token exchange endpoint.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "http://localhost:3000/api/token";

/// Default caption/transcription language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default HTTP timeout for the token and assistant endpoints.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for the HTTP timeout.
pub const MAX_HTTP_TIMEOUT_SECONDS: u64 = 300;

/// Meeting client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Api key scoping the transport clients.
    pub api_key: SecretString,

    /// Token exchange URL (default: `http://localhost:3000/api/token`).
    pub token_endpoint: String,

    /// Base URL of the backend assistant. `None` disables the notification.
    pub assistant_endpoint: Option<String>,

    /// Locale for transcription and captions (default: "en").
    pub default_language: String,

    /// Features activated after join, in activation order.
    pub features: Vec<Feature>,

    /// Call type on the calling service (default: "default").
    pub call_type: String,

    /// Timeout for outbound HTTP requests.
    pub http_timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"[REDACTED]")
            .field("token_endpoint", &self.token_endpoint)
            .field("assistant_endpoint", &self.assistant_endpoint)
            .field("default_language", &self.default_language)
            .field("features", &self.features)
            .field("call_type", &self.call_type)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid feature configuration: {0}")]
    InvalidFeature(String),

    #[error("Invalid HTTP timeout configuration: {0}")]
    InvalidTimeout(String),
}

/// The part of the configuration the session controller needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub call_type: String,
    pub features: Vec<Feature>,
    pub language: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            call_type: DEFAULT_CALL_TYPE.to_string(),
            features: vec![Feature::Transcription],
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = vars
            .get("MEETING_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("MEETING_API_KEY".to_string()))?;
        let api_key = SecretString::from(api_key.clone());

        let token_endpoint = vars
            .get("MEETING_TOKEN_ENDPOINT")
            .cloned()
            .unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.to_string());

        let assistant_endpoint = vars
            .get("MEETING_ASSISTANT_ENDPOINT")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        let default_language = vars
            .get("MEETING_DEFAULT_LANGUAGE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let features = match vars.get("MEETING_FEATURES") {
            Some(value) => parse_features(value)?,
            None => vec![Feature::Transcription],
        };

        let call_type = vars
            .get("MEETING_CALL_TYPE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CALL_TYPE.to_string());

        let http_timeout_seconds = if let Some(value_str) = vars.get("MEETING_HTTP_TIMEOUT_SECONDS")
        {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTimeout(format!(
                    "MEETING_HTTP_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 || value > MAX_HTTP_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidTimeout(format!(
                    "MEETING_HTTP_TIMEOUT_SECONDS must be between 1 and {MAX_HTTP_TIMEOUT_SECONDS}, got {value}"
                )));
            }

            value
        } else {
            DEFAULT_HTTP_TIMEOUT_SECONDS
        };

        Ok(ClientConfig {
            api_key,
            token_endpoint,
            assistant_endpoint,
            default_language,
            features,
            call_type,
            http_timeout: Duration::from_secs(http_timeout_seconds),
        })
    }

    /// Settings handed to each session controller.
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            call_type: self.call_type.clone(),
            features: self.features.clone(),
            language: self.default_language.clone(),
        }
    }
}

/// Parse a comma separated feature list. `none` (alone) disables all
/// features; duplicates are dropped keeping first occurrence.
fn parse_features(value: &str) -> Result<Vec<Feature>, ConfigError> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }

    let mut features = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let feature: Feature = part.parse().map_err(ConfigError::InvalidFeature)?;
        if !features.contains(&feature) {
            features.push(feature);
        }
    }
    Ok(features)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([("MEETING_API_KEY".to_string(), "key-abc".to_string())])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = ClientConfig::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.api_key.expose_secret(), "key-abc");
        assert_eq!(config.token_endpoint, DEFAULT_TOKEN_ENDPOINT);
        assert_eq!(config.assistant_endpoint, None);
        assert_eq!(config.default_language, "en");
        assert_eq!(config.features, vec![Feature::Transcription]);
        assert_eq!(config.call_type, "default");
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_api_key() {
        let err = ClientConfig::from_vars(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "MEETING_API_KEY"));
    }

    #[test]
    fn test_empty_api_key_is_missing() {
        let mut vars = base_vars();
        vars.insert("MEETING_API_KEY".to_string(), String::new());
        assert!(ClientConfig::from_vars(&vars).is_err());
    }

    #[test]
    fn test_custom_values() {
        let mut vars = base_vars();
        vars.insert(
            "MEETING_ASSISTANT_ENDPOINT".to_string(),
            "http://localhost:8000/".to_string(),
        );
        vars.insert("MEETING_DEFAULT_LANGUAGE".to_string(), "de".to_string());
        vars.insert(
            "MEETING_FEATURES".to_string(),
            "closed_captions, transcription".to_string(),
        );
        vars.insert("MEETING_CALL_TYPE".to_string(), "livestream".to_string());
        vars.insert("MEETING_HTTP_TIMEOUT_SECONDS".to_string(), "3".to_string());

        let config = ClientConfig::from_vars(&vars).unwrap();

        assert_eq!(
            config.assistant_endpoint.as_deref(),
            Some("http://localhost:8000")
        );
        assert_eq!(
            config.features,
            vec![Feature::ClosedCaptions, Feature::Transcription]
        );
        assert_eq!(config.http_timeout, Duration::from_secs(3));

        let settings = config.session_settings();
        assert_eq!(settings.call_type, "livestream");
        assert_eq!(settings.language, "de");
    }

    #[test]
    fn test_features_none_disables_activation() {
        let mut vars = base_vars();
        vars.insert("MEETING_FEATURES".to_string(), "none".to_string());
        assert!(ClientConfig::from_vars(&vars).unwrap().features.is_empty());
    }

    #[test]
    fn test_duplicate_features_are_dropped() {
        let mut vars = base_vars();
        vars.insert(
            "MEETING_FEATURES".to_string(),
            "transcription,transcription".to_string(),
        );
        assert_eq!(
            ClientConfig::from_vars(&vars).unwrap().features,
            vec![Feature::Transcription]
        );
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let mut vars = base_vars();
        vars.insert("MEETING_FEATURES".to_string(), "recording".to_string());
        let err = ClientConfig::from_vars(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFeature(_)));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        for bad in ["0", "-1", "abc", "301"] {
            let mut vars = base_vars();
            vars.insert("MEETING_HTTP_TIMEOUT_SECONDS".to_string(), bad.to_string());
            let err = ClientConfig::from_vars(&vars).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidTimeout(_)),
                "expected InvalidTimeout for '{bad}'"
            );
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::from_vars(&base_vars()).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("key-abc"));
    }
}
