//! Errors surfaced through the host error channel.

use crate::capture::EncodeError;
use crate::media::MediaError;
use crate::render::SurfaceError;
use crate::transport::TransportError;
use thiserror::Error;

/// Any failure a widget operation can report.
#[derive(Debug, Error)]
pub enum PhotoCamError {
    #[error("capture error: PhotoCam not ready")]
    NotReady,
    #[error("capture error: a capture is already in progress")]
    CaptureInProgress,
    #[error("device enumeration is not supported")]
    EnumerationUnsupported,
    #[error("failed to spawn {task} task: {reason}")]
    Spawn { task: &'static str, reason: String },
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
