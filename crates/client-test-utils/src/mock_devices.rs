//! Mock local media devices.
//!
//! # Example
//!
//! ```rust,ignore
//! use client_test_utils::MockMediaDevices;
//! use meeting_client::devices::{DeviceError, DeviceKind};
//!
//! // Camera works, microphone permission denied
//! let devices = MockMediaDevices::all()
//!     .fail_acquire(DeviceError::PermissionDenied(DeviceKind::AudioInput));
//! ```

use async_trait::async_trait;
use meeting_client::devices::{DeviceError, DeviceInfo, DeviceKind, DeviceLease, MediaDevices};
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock media devices with configurable listings and acquisition failures.
#[derive(Debug, Default)]
pub struct MockMediaDevices {
    listed: Vec<DeviceKind>,
    enumeration_error: Option<DeviceError>,
    acquire_errors: HashMap<DeviceKind, DeviceError>,
    acquired: Mutex<Vec<DeviceKind>>,
    released: Mutex<Vec<DeviceKind>>,
}

impl MockMediaDevices {
    /// No devices at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// One camera and one microphone, both working.
    #[must_use]
    pub fn all() -> Self {
        Self::none()
            .with_device(DeviceKind::VideoInput)
            .with_device(DeviceKind::AudioInput)
    }

    /// List a device of the given kind.
    #[must_use]
    pub fn with_device(mut self, kind: DeviceKind) -> Self {
        self.listed.push(kind);
        self
    }

    /// Fail acquisition for the error's device kind.
    #[must_use]
    pub fn fail_acquire(mut self, error: DeviceError) -> Self {
        let kind = match &error {
            DeviceError::NotFound(kind)
            | DeviceError::PermissionDenied(kind)
            | DeviceError::Busy(kind) => *kind,
            other => panic!("fail_acquire needs a per-kind error, got {other:?}"),
        };
        self.acquire_errors.insert(kind, error);
        self
    }

    /// Fail enumeration.
    #[must_use]
    pub fn fail_enumeration(mut self, message: impl Into<String>) -> Self {
        self.enumeration_error = Some(DeviceError::Enumeration(message.into()));
        self
    }

    /// Kinds successfully acquired, in order.
    pub fn acquired(&self) -> Vec<DeviceKind> {
        self.acquired.lock().unwrap().clone()
    }

    /// Kinds released, in order.
    pub fn released(&self) -> Vec<DeviceKind> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDevices for MockMediaDevices {
    async fn enumerate(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        if let Some(error) = &self.enumeration_error {
            return Err(error.clone());
        }

        Ok(self
            .listed
            .iter()
            .enumerate()
            .map(|(i, kind)| DeviceInfo {
                device_id: format!("{kind}-{i}"),
                kind: *kind,
                label: format!("Mock {kind}"),
            })
            .collect())
    }

    async fn acquire(&self, kind: DeviceKind) -> Result<DeviceLease, DeviceError> {
        if let Some(error) = self.acquire_errors.get(&kind) {
            return Err(error.clone());
        }

        self.acquired.lock().unwrap().push(kind);
        Ok(DeviceLease {
            kind,
            device_id: format!("{kind}-lease"),
        })
    }

    async fn release(&self, lease: DeviceLease) {
        self.released.lock().unwrap().push(lease.kind);
    }
}
