//! Native camera capability backed by `nokhwa`.
//!
//! `nokhwa::Camera` is `!Send`, so each stream owns a capture thread that
//! opens the camera, keeps the newest decoded frame in a shared slot and
//! exits when its stop channel fires.

use super::{
    DeviceDescriptor, FacingMode, Frame, MediaCapability, MediaError, MediaStream,
    StreamConstraints,
};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, CameraInfo, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Media capability for locally attached cameras.
#[derive(Debug, Default)]
pub struct NativeMedia;

impl NativeMedia {
    /// Creates the capability.
    pub fn new() -> Self {
        Self
    }

    fn backend() -> Option<ApiBackend> {
        nokhwa::native_api_backend()
    }

    fn query() -> Result<Vec<CameraInfo>, MediaError> {
        let backend = Self::backend().ok_or(MediaError::Unsupported("camera backend"))?;
        nokhwa::query(backend).map_err(|e| MediaError::EnumerationFailed(e.to_string()))
    }

    fn resolve_index(constraints: &StreamConstraints) -> Result<CameraIndex, MediaError> {
        match constraints {
            StreamConstraints::Default | StreamConstraints::FacingMode(FacingMode::User) => {
                Ok(CameraIndex::Index(0))
            }
            StreamConstraints::FacingMode(FacingMode::Environment) => {
                // Native backends do not report facing; the last camera is
                // usually the rear one on devices that have two.
                let cameras = Self::query()?;
                let last = cameras
                    .last()
                    .ok_or_else(|| MediaError::DeviceNotFound("environment".to_string()))?;
                warn!(camera = %last.human_name(), "facing mode approximated by device order");
                Ok(last.index().clone())
            }
            StreamConstraints::DeviceId(id) => {
                if let Ok(index) = id.parse::<u32>() {
                    return Ok(CameraIndex::Index(index));
                }
                Self::query()?
                    .into_iter()
                    .find(|info| info.human_name() == *id || info.index().as_string() == *id)
                    .map(|info| info.index().clone())
                    .ok_or_else(|| MediaError::DeviceNotFound(id.clone()))
            }
        }
    }
}

impl MediaCapability for NativeMedia {
    fn supports_user_media(&self) -> bool {
        Self::backend().is_some()
    }

    fn supports_enumeration(&self) -> bool {
        Self::backend().is_some()
    }

    fn acquire(&self, constraints: &StreamConstraints) -> Result<Box<dyn MediaStream>, MediaError> {
        let index = Self::resolve_index(constraints)?;
        let latest = Arc::new(Mutex::new(None));
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (opened_tx, opened_rx) = bounded::<Result<(), MediaError>>(1);

        let slot = Arc::clone(&latest);
        let worker = thread::Builder::new()
            .name("photocam-native".to_string())
            .spawn(move || capture_thread(index, slot, stop_rx, opened_tx))
            .map_err(|e| MediaError::AcquisitionFailed(e.to_string()))?;

        match opened_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(NativeStream {
                latest,
                stop_tx: Some(stop_tx),
                worker: Some(worker),
            })),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => Err(MediaError::AcquisitionFailed(
                "capture thread exited before opening the camera".to_string(),
            )),
        }
    }

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, MediaError> {
        Ok(Self::query()?
            .into_iter()
            .map(|info| DeviceDescriptor {
                device_id: info.index().as_string(),
                label: info.human_name(),
                kind: super::DeviceKind::VideoInput,
                group_id: None,
            })
            .collect())
    }
}

fn capture_thread(
    index: CameraIndex,
    latest: Arc<Mutex<Option<Frame>>>,
    stop_rx: Receiver<()>,
    opened_tx: Sender<Result<(), MediaError>>,
) {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

    let mut camera = match Camera::new(index.clone(), requested) {
        Ok(c) => c,
        Err(e) => {
            let _ = opened_tx.send(Err(MediaError::AcquisitionFailed(e.to_string())));
            return;
        }
    };
    if let Err(e) = camera.open_stream() {
        let _ = opened_tx.send(Err(MediaError::AcquisitionFailed(e.to_string())));
        return;
    }

    let resolution = camera.resolution();
    info!(
        device = %index.as_string(),
        width = resolution.width(),
        height = resolution.height(),
        "native camera stream opened"
    );
    let _ = opened_tx.send(Ok(()));

    let mut sequence = 0u64;
    loop {
        match stop_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        let decoded = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>());
        match decoded {
            Ok(image) => {
                sequence += 1;
                let (width, height) = (image.width(), image.height());
                *latest.lock() = Some(Frame::new(image.into_raw(), width, height, sequence));
            }
            Err(e) => debug!(error = %e, "dropped undecodable frame"),
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!(error = %e, "failed to stop native camera stream");
    }
    debug!(device = %index.as_string(), "native capture thread exited");
}

struct NativeStream {
    latest: Arc<Mutex<Option<Frame>>>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl MediaStream for NativeStream {
    fn read_frame(&mut self) -> Result<Frame, MediaError> {
        self.latest.lock().clone().ok_or(MediaError::FrameUnavailable)
    }

    fn is_ready(&self) -> bool {
        self.worker.is_some() && self.latest.lock().is_some()
    }

    fn track_count(&self) -> usize {
        usize::from(self.worker.is_some())
    }

    fn stop_tracks(&mut self) -> Result<(), MediaError> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        *self.latest.lock() = None;
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| MediaError::TrackStop("capture thread panicked".to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        let _ = self.stop_tracks();
    }
}
