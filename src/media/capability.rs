//! Device and stream capabilities supplied to the widget.
//!
//! The widget never touches camera hardware directly. Everything it needs
//! (stream acquisition, device enumeration, track release) goes through a
//! [`MediaCapability`], so a platform backend and the synthetic
//! [`MockMedia`](super::MockMedia) are interchangeable.

use super::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by media capabilities and streams.
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("{0} is not supported by this platform")]
    Unsupported(&'static str),
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to acquire media stream: {0}")]
    AcquisitionFailed(String),
    #[error("device enumeration failed: {0}")]
    EnumerationFailed(String),
    #[error("no frame available")]
    FrameUnavailable,
    #[error("failed to stop media track: {0}")]
    TrackStop(String),
}

/// Kind of a media device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Camera.
    VideoInput,
    /// Microphone.
    AudioInput,
    /// Speaker or headset.
    AudioOutput,
}

/// One discovered media device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Opaque identifier, usable as an exact device selector.
    pub device_id: String,
    /// Human-readable label.
    pub label: String,
    /// Device kind.
    pub kind: DeviceKind,
    /// Identifier shared by devices on the same physical unit.
    pub group_id: Option<String>,
}

impl DeviceDescriptor {
    /// Creates a video input descriptor.
    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
            group_id: None,
        }
    }

    /// Whether this device is a camera.
    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }
}

/// Which way a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacingMode {
    /// Front camera, facing the user.
    User,
    /// Rear camera.
    Environment,
}

impl FacingMode {
    /// Recognizes the facing-mode keywords `user` and `environment`.
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "environment" => Some(Self::Environment),
            _ => None,
        }
    }

    /// The keyword for this facing mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Environment => "environment",
        }
    }
}

/// Video constraints passed to [`MediaCapability::acquire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamConstraints {
    /// The platform's default video input.
    Default,
    /// A camera facing the given way.
    FacingMode(FacingMode),
    /// Exactly the device with this identifier.
    DeviceId(String),
}

impl StreamConstraints {
    /// Applies the device-selection policy to a configured device value.
    ///
    /// A facing-mode keyword wins over an identifier; an absent or empty
    /// value selects the default camera.
    pub fn for_device(device: Option<&str>) -> Self {
        match device {
            Some(value) => match FacingMode::from_keyword(value) {
                Some(mode) => Self::FacingMode(mode),
                None if !value.is_empty() => Self::DeviceId(value.to_string()),
                None => Self::Default,
            },
            None => Self::Default,
        }
    }
}

impl fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "{{ video: true }}"),
            Self::FacingMode(mode) => write!(f, "{{ video: {{ facingMode: {} }} }}", mode.as_str()),
            Self::DeviceId(id) => write!(f, "{{ video: {{ deviceId: {} }} }}", id),
        }
    }
}

/// A live camera stream.
pub trait MediaStream: Send {
    /// Pulls the most recent frame.
    fn read_frame(&mut self) -> Result<Frame, MediaError>;

    /// Whether the stream has a frame ready to be drawn.
    fn is_ready(&self) -> bool;

    /// Number of tracks carried by the stream.
    fn track_count(&self) -> usize;

    /// Signals every track to stop, releasing the camera.
    fn stop_tracks(&mut self) -> Result<(), MediaError>;
}

/// Platform media services.
///
/// `acquire` and `enumerate` may block; the widget always calls them from
/// background threads.
pub trait MediaCapability: Send + Sync {
    /// Whether live stream acquisition is available at all.
    fn supports_user_media(&self) -> bool;

    /// Whether device enumeration is available at all.
    fn supports_enumeration(&self) -> bool;

    /// Opens a stream matching the constraints.
    fn acquire(&self, constraints: &StreamConstraints) -> Result<Box<dyn MediaStream>, MediaError>;

    /// Lists every media device, in discovery order.
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, MediaError>;
}
