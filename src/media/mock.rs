//! Synthetic media capability for tests and headless demos.

use super::{
    DeviceDescriptor, DeviceKind, Frame, MediaCapability, MediaError, MediaStream,
    StreamConstraints,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct MockOptions {
    user_media: bool,
    enumeration: bool,
    devices: Vec<DeviceDescriptor>,
    fail_acquire: bool,
    fail_track_stop: bool,
    acquire_delay: Duration,
    frame_width: u32,
    frame_height: u32,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            user_media: true,
            enumeration: true,
            devices: vec![
                DeviceDescriptor::video_input("mock-cam-0", "Mock Front Camera"),
                DeviceDescriptor {
                    device_id: "mock-mic-0".to_string(),
                    label: "Mock Microphone".to_string(),
                    kind: DeviceKind::AudioInput,
                    group_id: None,
                },
                DeviceDescriptor::video_input("mock-cam-1", "Mock Rear Camera"),
            ],
            fail_acquire: false,
            fail_track_stop: false,
            acquire_delay: Duration::ZERO,
            frame_width: 64,
            frame_height: 48,
        }
    }
}

/// Stop/read bookkeeping for one issued stream.
#[derive(Debug, Default)]
struct MockTrack {
    stopped: AtomicBool,
    frames_read: AtomicU64,
}

#[derive(Debug, Default)]
struct MockInner {
    options: Mutex<MockOptions>,
    requests: Mutex<Vec<StreamConstraints>>,
    tracks: Mutex<Vec<Arc<MockTrack>>>,
}

/// Mock media capability that produces synthetic frames.
///
/// Clones share state, so a test can hand one clone to the widget and
/// inspect requests and track releases through another.
#[derive(Debug, Clone, Default)]
pub struct MockMedia {
    inner: Arc<MockInner>,
}

impl MockMedia {
    /// Creates a capability with two cameras and a microphone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes stream acquisition support.
    pub fn without_user_media(self) -> Self {
        self.inner.options.lock().user_media = false;
        self
    }

    /// Removes device enumeration support.
    pub fn without_enumeration(self) -> Self {
        self.inner.options.lock().enumeration = false;
        self
    }

    /// Replaces the device list.
    pub fn with_devices(self, devices: Vec<DeviceDescriptor>) -> Self {
        self.inner.options.lock().devices = devices;
        self
    }

    /// Makes every acquisition fail.
    pub fn failing_acquire(self) -> Self {
        self.inner.options.lock().fail_acquire = true;
        self
    }

    /// Makes track release fail (after marking the track stopped).
    pub fn failing_track_stop(self) -> Self {
        self.inner.options.lock().fail_track_stop = true;
        self
    }

    /// Delays acquisition, simulating a slow permission prompt.
    pub fn with_acquire_delay(self, delay: Duration) -> Self {
        self.inner.options.lock().acquire_delay = delay;
        self
    }

    /// Sets the native size of produced frames.
    pub fn with_frame_size(self, width: u32, height: u32) -> Self {
        {
            let mut options = self.inner.options.lock();
            options.frame_width = width;
            options.frame_height = height;
        }
        self
    }

    /// Constraints of every acquisition request, in order.
    pub fn requests(&self) -> Vec<StreamConstraints> {
        self.inner.requests.lock().clone()
    }

    /// Number of acquisition requests made.
    pub fn acquire_count(&self) -> usize {
        self.inner.requests.lock().len()
    }

    /// Number of streams handed out.
    pub fn stream_count(&self) -> usize {
        self.inner.tracks.lock().len()
    }

    /// Number of streams whose tracks have been stopped.
    pub fn stopped_count(&self) -> usize {
        self.inner
            .tracks
            .lock()
            .iter()
            .filter(|t| t.stopped.load(Ordering::SeqCst))
            .count()
    }

    /// Whether every stream handed out has been stopped.
    pub fn all_stopped(&self) -> bool {
        self.stopped_count() == self.stream_count()
    }

    /// Total frames read across all streams.
    pub fn frames_read(&self) -> u64 {
        self.inner
            .tracks
            .lock()
            .iter()
            .map(|t| t.frames_read.load(Ordering::SeqCst))
            .sum()
    }
}

impl MediaCapability for MockMedia {
    fn supports_user_media(&self) -> bool {
        self.inner.options.lock().user_media
    }

    fn supports_enumeration(&self) -> bool {
        self.inner.options.lock().enumeration
    }

    fn acquire(&self, constraints: &StreamConstraints) -> Result<Box<dyn MediaStream>, MediaError> {
        let options = self.inner.options.lock().clone();
        self.inner.requests.lock().push(constraints.clone());

        if !options.acquire_delay.is_zero() {
            std::thread::sleep(options.acquire_delay);
        }
        if options.fail_acquire {
            return Err(MediaError::AcquisitionFailed("permission denied".to_string()));
        }
        if let StreamConstraints::DeviceId(id) = constraints {
            if !options.devices.iter().any(|d| d.is_video_input() && &d.device_id == id) {
                return Err(MediaError::DeviceNotFound(id.clone()));
            }
        }

        let track = Arc::new(MockTrack::default());
        self.inner.tracks.lock().push(Arc::clone(&track));
        tracing::debug!(%constraints, "MockMedia stream acquired");

        Ok(Box::new(MockStream {
            track,
            width: options.frame_width,
            height: options.frame_height,
            sequence: 0,
            fail_stop: options.fail_track_stop,
        }))
    }

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, MediaError> {
        let options = self.inner.options.lock();
        if !options.enumeration {
            return Err(MediaError::Unsupported("device enumeration"));
        }
        Ok(options.devices.clone())
    }
}

struct MockStream {
    track: Arc<MockTrack>,
    width: u32,
    height: u32,
    sequence: u64,
    fail_stop: bool,
}

impl MediaStream for MockStream {
    fn read_frame(&mut self) -> Result<Frame, MediaError> {
        if self.track.stopped.load(Ordering::SeqCst) {
            return Err(MediaError::FrameUnavailable);
        }

        // Deterministic gradient that shifts with the sequence number.
        let byte_count = (self.width * self.height * 3) as usize;
        let pixels: Vec<u8> = (0..byte_count)
            .map(|i| ((i as u64 + self.sequence) % 256) as u8)
            .collect();

        self.sequence += 1;
        self.track.frames_read.fetch_add(1, Ordering::SeqCst);
        Ok(Frame::new(pixels, self.width, self.height, self.sequence))
    }

    fn is_ready(&self) -> bool {
        !self.track.stopped.load(Ordering::SeqCst)
    }

    fn track_count(&self) -> usize {
        1
    }

    fn stop_tracks(&mut self) -> Result<(), MediaError> {
        self.track.stopped.store(true, Ordering::SeqCst);
        if self.fail_stop {
            return Err(MediaError::TrackStop("mock track refused to stop".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_stream_lifecycle() {
        let media = MockMedia::new().with_frame_size(8, 4);
        let mut stream = media.acquire(&StreamConstraints::Default).unwrap();

        assert!(stream.is_ready());
        let frame = stream.read_frame().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);

        stream.stop_tracks().unwrap();
        assert!(!stream.is_ready());
        assert!(media.all_stopped());
        assert!(matches!(stream.read_frame(), Err(MediaError::FrameUnavailable)));
    }

    #[test]
    fn test_unknown_device_rejected() {
        let media = MockMedia::new();
        let result = media.acquire(&StreamConstraints::DeviceId("nope".to_string()));

        assert!(matches!(result, Err(MediaError::DeviceNotFound(_))));
        assert_eq!(media.acquire_count(), 1);
        assert_eq!(media.stream_count(), 0);
    }

    #[test]
    fn test_enumeration_lists_all_kinds() {
        let devices = MockMedia::new().enumerate().unwrap();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices.iter().filter(|d| d.is_video_input()).count(), 2);
    }
}
