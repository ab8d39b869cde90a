//! Device capability probing.
//!
//! Best-effort check of the local camera and microphone before joining. A
//! device class counts as available only when enumeration lists a device of
//! that kind AND a momentary acquisition of it succeeds. Probing never fails:
//! problems degrade the summary and add a warning so the participant can
//! still join audio-only, video-only, or listen-only.

use crate::observability::metrics;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Warning clause for an unavailable camera.
pub const CAMERA_UNAVAILABLE: &str = "Camera unavailable";

/// Warning clause for an unavailable microphone.
pub const MICROPHONE_UNAVAILABLE: &str = "Microphone unavailable";

/// Separator between warning clauses.
const WARNING_SEPARATOR: &str = " & ";

/// Class of local input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
}

impl DeviceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::VideoInput => "videoinput",
            DeviceKind::AudioInput => "audioinput",
        }
    }

    const fn unavailable_clause(self) -> &'static str {
        match self {
            DeviceKind::VideoInput => CAMERA_UNAVAILABLE,
            DeviceKind::AudioInput => MICROPHONE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An enumerated input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: String,
    pub kind: DeviceKind,
    pub label: String,
}

/// A device held open by a successful acquisition. Must be handed back via
/// [`MediaDevices::release`].
#[derive(Debug, PartialEq, Eq)]
pub struct DeviceLease {
    pub kind: DeviceKind,
    pub device_id: String,
}

/// Device access failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("Device enumeration failed: {0}")]
    Enumeration(String),

    #[error("No {0} device found")]
    NotFound(DeviceKind),

    #[error("Permission denied for {0}")]
    PermissionDenied(DeviceKind),

    #[error("{0} device is busy")]
    Busy(DeviceKind),

    #[error("Device error: {0}")]
    Other(String),
}

/// Local media device access (platform specific).
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// List the available input devices.
    async fn enumerate(&self) -> Result<Vec<DeviceInfo>, DeviceError>;

    /// Open a device of the given kind.
    async fn acquire(&self, kind: DeviceKind) -> Result<DeviceLease, DeviceError>;

    /// Close a previously acquired device.
    async fn release(&self, lease: DeviceLease);
}

/// Result of a capability probe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySummary {
    pub has_camera: bool,
    pub has_microphone: bool,
    /// Advisory text for the participant, `None` when nothing failed.
    pub warning: Option<String>,
}

impl CapabilitySummary {
    /// Summary used when probing could not run at all.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Probes local devices and produces a [`CapabilitySummary`].
#[derive(Clone)]
pub struct CapabilityProber {
    devices: Arc<dyn MediaDevices>,
}

impl CapabilityProber {
    #[must_use]
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self { devices }
    }

    /// Probe camera and microphone availability.
    #[instrument(skip_all, name = "meeting_client.devices.probe")]
    pub async fn probe(&self) -> CapabilitySummary {
        let devices = match self.devices.enumerate().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(
                    target: "meeting_client.devices",
                    error = %e,
                    "Device enumeration failed, continuing without camera or microphone"
                );
                metrics::record_probe(false, false);
                return CapabilitySummary::unavailable();
            }
        };

        let mut clauses: Vec<&'static str> = Vec::new();
        let has_camera = self
            .check_kind(&devices, DeviceKind::VideoInput, &mut clauses)
            .await;
        let has_microphone = self
            .check_kind(&devices, DeviceKind::AudioInput, &mut clauses)
            .await;

        let warning = if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(WARNING_SEPARATOR))
        };

        info!(
            target: "meeting_client.devices",
            has_camera,
            has_microphone,
            warning = warning.as_deref().unwrap_or(""),
            "Device probe complete"
        );
        metrics::record_probe(has_camera, has_microphone);

        CapabilitySummary {
            has_camera,
            has_microphone,
            warning,
        }
    }

    /// Check one device class; pushes a warning clause when unavailable.
    async fn check_kind(
        &self,
        devices: &[DeviceInfo],
        kind: DeviceKind,
        clauses: &mut Vec<&'static str>,
    ) -> bool {
        if !devices.iter().any(|d| d.kind == kind) {
            debug!(target: "meeting_client.devices", kind = %kind, "No device of this kind enumerated");
            clauses.push(kind.unavailable_clause());
            return false;
        }

        match self.devices.acquire(kind).await {
            Ok(lease) => {
                self.devices.release(lease).await;
                true
            }
            Err(e) => {
                warn!(target: "meeting_client.devices", kind = %kind, error = %e, "Device acquisition failed");
                clauses.push(kind.unavailable_clause());
                false
            }
        }
    }
}
