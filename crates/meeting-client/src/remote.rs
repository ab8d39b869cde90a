//! Remote calling service contract.
//!
//! The calling service is an opaque external dependency. This module defines
//! the operations the session controller needs from it (create-or-get, join,
//! feature toggles, local media publish, leave, event subscription) and the
//! request shapes sent with them. Implementations live outside this crate;
//! the transport connector hands one out with every video client.

use crate::devices::CapabilitySummary;
use crate::errors::RemoteError;
use async_trait::async_trait;
use common::types::{CallId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::broadcast;

/// Default call type on the calling service.
pub const DEFAULT_CALL_TYPE: &str = "default";

/// Role given to the joining participant.
pub const CALL_MEMBER_ROLE: &str = "call_member";

/// Default audio output device requested in call settings.
pub const DEFAULT_AUDIO_DEVICE: &str = "speaker";

/// Target video resolution requested in call settings.
pub const TARGET_RESOLUTION: Resolution = Resolution {
    width: 640,
    height: 480,
};

/// Caption/transcription mode requested at creation time.
pub const CAPTION_MODE_AUTO_ON: &str = "auto-on";

/// Optional session feature enabled after join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Server-side transcription of the call.
    Transcription,
    /// Live closed captions.
    ClosedCaptions,
}

impl Feature {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Feature::Transcription => "transcription",
            Feature::ClosedCaptions => "closed_captions",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transcription" => Ok(Feature::Transcription),
            "closed_captions" | "captions" => Ok(Feature::ClosedCaptions),
            other => Err(format!("unknown feature '{other}'")),
        }
    }
}

/// Reference to a call on the calling service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRef {
    pub call_type: String,
    pub call_id: CallId,
}

impl CallRef {
    #[must_use]
    pub fn new(call_type: impl Into<String>, call_id: CallId) -> Self {
        Self {
            call_type: call_type.into(),
            call_id,
        }
    }
}

/// One entry of the initial membership list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRequest {
    pub user_id: UserId,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub mic_default_on: bool,
    pub default_device: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSettings {
    pub camera_default_on: bool,
    pub target_resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSettings {
    pub mode: String,
    pub language: String,
}

/// Settings override sent when the call is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSettings {
    pub audio: AudioSettings,
    pub video: VideoSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<CaptionSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_captions: Option<CaptionSettings>,
}

impl CallSettings {
    /// Build settings from the probed capabilities and the configured
    /// feature set. Default-on flags mirror what the probe found.
    #[must_use]
    pub fn new(capabilities: &CapabilitySummary, features: &[Feature], language: &str) -> Self {
        let caption = || CaptionSettings {
            mode: CAPTION_MODE_AUTO_ON.to_string(),
            language: language.to_string(),
        };

        Self {
            audio: AudioSettings {
                mic_default_on: capabilities.has_microphone,
                default_device: DEFAULT_AUDIO_DEVICE.to_string(),
            },
            video: VideoSettings {
                camera_default_on: capabilities.has_camera,
                target_resolution: TARGET_RESOLUTION,
            },
            transcription: features.contains(&Feature::Transcription).then(caption),
            closed_captions: features.contains(&Feature::ClosedCaptions).then(caption),
        }
    }
}

/// Payload for create-or-get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCallRequest {
    pub created_by_id: UserId,
    pub members: Vec<MemberRequest>,
    pub settings_override: CallSettings,
}

impl CreateCallRequest {
    /// Request with the creator as the only initial member.
    #[must_use]
    pub fn for_creator(creator: &UserId, settings: CallSettings) -> Self {
        Self {
            created_by_id: creator.clone(),
            members: vec![MemberRequest {
                user_id: creator.clone(),
                role: CALL_MEMBER_ROLE.to_string(),
            }],
            settings_override: settings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOptions {
    /// Create the call if it does not exist yet.
    pub create: bool,
}

/// A call this participant has joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedCall {
    pub call: CallRef,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureOptions {
    pub language: String,
}

/// Which local tracks to publish after join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalMedia {
    pub camera: bool,
    pub microphone: bool,
}

impl LocalMedia {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.camera && !self.microphone
    }
}

/// Events emitted by the calling service for a joined call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    SessionStarted,
    SessionEnded,
    ParticipantJoined(UserId),
    ParticipantLeft(UserId),
    Other(String),
}

impl CallEvent {
    /// Event type name as emitted on the wire.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            CallEvent::SessionStarted => "call.session_started",
            CallEvent::SessionEnded => "call.session_ended",
            CallEvent::ParticipantJoined(_) => "call.session_participant_joined",
            CallEvent::ParticipantLeft(_) => "call.session_participant_left",
            CallEvent::Other(name) => name,
        }
    }
}

/// Operations of the remote calling service.
#[async_trait]
pub trait CallService: Send + Sync {
    /// Create the call if needed, or fetch the existing record.
    async fn get_or_create_call(
        &self,
        call: &CallRef,
        request: &CreateCallRequest,
    ) -> Result<(), RemoteError>;

    /// Join the call.
    async fn join(&self, call: &CallRef, options: JoinOptions) -> Result<JoinedCall, RemoteError>;

    async fn enable_feature(
        &self,
        call: &JoinedCall,
        feature: Feature,
        options: &FeatureOptions,
    ) -> Result<(), RemoteError>;

    async fn disable_feature(&self, call: &JoinedCall, feature: Feature)
        -> Result<(), RemoteError>;

    /// Start publishing the selected local tracks.
    async fn publish_local_media(
        &self,
        call: &JoinedCall,
        media: LocalMedia,
    ) -> Result<(), RemoteError>;

    async fn leave(&self, call: &JoinedCall) -> Result<(), RemoteError>;

    /// Subscribe to events for a joined call.
    fn subscribe(&self, call: &JoinedCall) -> Result<broadcast::Receiver<CallEvent>, RemoteError>;
}
