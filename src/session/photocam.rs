//! The PhotoCam widget.

use super::state::{render_tick, Canvas, CaptureGuard, SessionCore, SessionState};
use super::{PhotoCamError, SessionStats};
use crate::capture::encode_surface;
use crate::config::{PhotoCamConfig, Settings};
use crate::media::{DeviceDescriptor, MediaCapability, MediaError, MediaStream, StreamConstraints};
use crate::render::{DrawFullFrame, HeadlessHost, ImageHandler, RenderLoop, SurfaceHost, VideoSink};
use crate::report::{ErrorReporter, TracingReporter};
use crate::transport::{AjaxRequest, Dispatcher, LogDispatcher};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Builder for [`PhotoCam`].
pub struct PhotoCamBuilder {
    id: String,
    config: PhotoCamConfig,
    media: Arc<dyn MediaCapability>,
    host: Option<Arc<dyn SurfaceHost>>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    handler: Option<Arc<dyn ImageHandler>>,
}

impl PhotoCamBuilder {
    /// Raw widget options.
    pub fn config(mut self, config: PhotoCamConfig) -> Self {
        self.config = config;
        self
    }

    /// Host that owns the widget's container. Defaults to a
    /// [`HeadlessHost`] with a container named after the widget.
    pub fn host(mut self, host: Arc<dyn SurfaceHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Request dispatcher. Defaults to [`LogDispatcher`].
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Error channel. Defaults to [`TracingReporter`].
    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Frame drawing strategy. Defaults to [`DrawFullFrame`].
    ///
    /// The handler may query the widget while drawing. Calling `capture`,
    /// `stop`, `restart` or `clean_up` from inside it deadlocks the render
    /// thread.
    pub fn image_handler(mut self, handler: Arc<dyn ImageHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Initializes the widget.
    ///
    /// Unless disabled, this starts device enumeration in the background
    /// and, when auto-start is on, starts the camera session.
    pub fn init(self) -> PhotoCam {
        let settings = self.config.normalize();
        let id = self.id;
        let host = self
            .host
            .unwrap_or_else(|| Arc::new(HeadlessHost::with_container(id.clone())));

        let widget = PhotoCam {
            settings,
            core: Arc::new(Mutex::new(SessionCore::new())),
            stats: Arc::new(SessionStats::default()),
            devices: Arc::new(Mutex::new(Vec::new())),
            render: Mutex::new(None),
            background: Mutex::new(Vec::new()),
            lifecycle: Mutex::new(()),
            media: self.media,
            host,
            dispatcher: self.dispatcher.unwrap_or_else(|| Arc::new(LogDispatcher)),
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
            handler: self.handler.unwrap_or_else(|| Arc::new(DrawFullFrame)),
            id,
        };

        if widget.settings.disabled {
            debug!(widget = %widget.id, "widget disabled, skipping initialization");
            return widget;
        }

        widget.load_device_list();
        if widget.settings.auto_start {
            debug!(widget = %widget.id, "auto start");
            widget.start();
        }
        widget
    }
}

/// A camera widget: live preview, still capture and hand-off of the
/// captured image to the server-side component model.
///
/// All operations take `&self` and may be called from any thread. None of
/// them return errors; failures go to the configured [`ErrorReporter`] or
/// the log. Dropping the widget releases the camera.
pub struct PhotoCam {
    id: String,
    settings: Settings,
    core: Arc<Mutex<SessionCore>>,
    stats: Arc<SessionStats>,
    devices: Arc<Mutex<Vec<DeviceDescriptor>>>,
    render: Mutex<Option<RenderLoop>>,
    background: Mutex<Vec<JoinHandle<()>>>,
    /// Serializes start/stop/restart/cleanup.
    lifecycle: Mutex<()>,
    media: Arc<dyn MediaCapability>,
    host: Arc<dyn SurfaceHost>,
    dispatcher: Arc<dyn Dispatcher>,
    reporter: Arc<dyn ErrorReporter>,
    handler: Arc<dyn ImageHandler>,
}

impl PhotoCam {
    /// Starts building a widget with identifier `id` on top of `media`.
    pub fn builder(id: impl Into<String>, media: Arc<dyn MediaCapability>) -> PhotoCamBuilder {
        PhotoCamBuilder {
            id: id.into(),
            config: PhotoCamConfig::default(),
            media,
            host: None,
            dispatcher: None,
            reporter: None,
            handler: None,
        }
    }

    /// Widget identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Normalized settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Activity counters.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.core.lock().state
    }

    /// Whether the camera session is running.
    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Whether a still capture is being encoded.
    pub fn is_capturing(&self) -> bool {
        self.core.lock().capturing
    }

    /// Whether a video sink and drawing surface currently exist.
    pub fn has_surface(&self) -> bool {
        self.core.lock().canvas.is_some()
    }

    /// Whether the video sink has a playing stream attached.
    pub fn has_stream(&self) -> bool {
        self.core.lock().stream_attached
    }

    /// Video input devices discovered so far, in discovery order.
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        self.devices.lock().clone()
    }

    /// Starts the camera session.
    ///
    /// Does nothing if the session is already running. The stream is
    /// acquired in the background; the session reports running at once
    /// and render ticks are skipped until the stream is attached.
    pub fn start(&self) {
        if self.ignored("start") {
            return;
        }
        let _lifecycle = self.lifecycle.lock();
        if let Err(e) = self.start_session() {
            self.report(&e);
        }
    }

    /// Stops the session and releases every camera resource. Safe to call
    /// at any time, any number of times.
    pub fn stop(&self) {
        if self.ignored("stop") {
            return;
        }
        let _lifecycle = self.lifecycle.lock();
        self.stop_session();
    }

    /// Stops and, if the session was running, starts it again.
    pub fn restart(&self) {
        if self.ignored("restart") {
            return;
        }
        let _lifecycle = self.lifecycle.lock();
        debug!(widget = %self.id, "restarting");

        let was_running = self.is_running();
        self.stop_session();
        if was_running {
            if let Err(e) = self.start_session() {
                self.report(&e);
            }
        }
    }

    /// Encodes the current surface and sends it to the dispatcher.
    ///
    /// Reports an error and sends nothing unless the session is running.
    pub fn capture(&self) {
        if self.ignored("capture") {
            return;
        }
        if let Err(e) = self.capture_and_send() {
            self.stats.record_capture_failure();
            self.report(&e);
        }
    }

    /// Sends an encoded payload as one request to the dispatcher.
    pub fn send_data(&self, payload: &str) {
        if self.ignored("send_data") {
            return;
        }
        if let Err(e) = self.dispatch(payload) {
            self.report(&e);
        }
    }

    /// Enumerates video input devices in the background, appending each
    /// one to [`PhotoCam::devices`].
    pub fn load_device_list(&self) {
        if self.ignored("load_device_list") {
            return;
        }
        if !self.media.supports_enumeration() {
            self.report(&PhotoCamError::EnumerationUnsupported);
            return;
        }
        debug!(widget = %self.id, "device enumeration supported");

        let id = self.id.clone();
        let media = Arc::clone(&self.media);
        let devices = Arc::clone(&self.devices);
        let stats = Arc::clone(&self.stats);
        let reporter = Arc::clone(&self.reporter);

        let spawned = thread::Builder::new()
            .name(format!("{}-devices", self.id))
            .spawn(move || match media.enumerate() {
                Ok(found) => {
                    for device in found.into_iter().filter(DeviceDescriptor::is_video_input) {
                        debug!(widget = %id, device_id = %device.device_id, label = %device.label, "device found");
                        devices.lock().push(device);
                        stats.record_device_discovered();
                    }
                }
                Err(e) => reporter.report(&id, &e.into()),
            });

        match spawned {
            Ok(handle) => self.track_background(handle),
            Err(e) => self.report(&PhotoCamError::Spawn {
                task: "device enumeration",
                reason: e.to_string(),
            }),
        }
    }

    /// Releases the stream, surface and render loop. Leaves the session
    /// stopped if it was active.
    pub fn clean_up(&self) {
        if self.ignored("clean_up") {
            return;
        }
        let _lifecycle = self.lifecycle.lock();
        self.release_resources();
    }

    /// Blocks until background acquisition and enumeration work finishes.
    pub fn wait_idle(&self) {
        let pending = std::mem::take(&mut *self.background.lock());
        for handle in pending {
            if handle.join().is_err() {
                warn!(widget = %self.id, "background task panicked");
            }
        }
    }

    fn ignored(&self, operation: &str) -> bool {
        if self.settings.disabled {
            debug!(widget = %self.id, operation, "widget disabled, ignoring");
        }
        self.settings.disabled
    }

    fn report(&self, error: &PhotoCamError) {
        self.reporter.report(&self.id, error);
    }

    fn track_background(&self, handle: JoinHandle<()>) {
        let mut background = self.background.lock();
        background.retain(|h| !h.is_finished());
        background.push(handle);
    }

    fn start_session(&self) -> Result<(), PhotoCamError> {
        if self.state().is_active() {
            debug!(widget = %self.id, "already running");
            return Ok(());
        }
        debug!(widget = %self.id, "starting");

        self.release_resources();

        if !self.media.supports_user_media() {
            warn!(widget = %self.id, "media stream acquisition not supported by platform");
            return Ok(());
        }

        let (width, height) = (self.settings.width, self.settings.height);
        let surface = self.host.create_surface(&self.id, width, height)?;

        let constraints = StreamConstraints::for_device(self.settings.device.as_deref());
        debug!(widget = %self.id, %constraints, "device constraints defined");

        let generation = {
            let mut core = self.core.lock();
            core.generation += 1;
            core.state = SessionState::Starting;
            core.stream_attached = false;
            core.canvas = Some(Canvas::shared(VideoSink::new(width, height), surface));
            core.generation
        };

        if let Err(e) = self.spawn_acquisition(generation, constraints) {
            self.release_resources();
            return Err(e);
        }

        self.core.lock().state = SessionState::Running;
        self.stats.record_session_started();

        let core = Arc::clone(&self.core);
        let handler = Arc::clone(&self.handler);
        let stats = Arc::clone(&self.stats);
        let render = RenderLoop::spawn(&self.id, self.settings.render_timeout, move || {
            render_tick(&core, handler.as_ref(), &stats);
        });
        match render {
            Ok(render) => *self.render.lock() = Some(render),
            Err(e) => {
                self.release_resources();
                return Err(PhotoCamError::Spawn {
                    task: "render loop",
                    reason: e.to_string(),
                });
            }
        }

        info!(widget = %self.id, generation, "camera session running");
        Ok(())
    }

    fn spawn_acquisition(
        &self,
        generation: u64,
        constraints: StreamConstraints,
    ) -> Result<(), PhotoCamError> {
        let id = self.id.clone();
        let media = Arc::clone(&self.media);
        let core = Arc::clone(&self.core);
        let reporter = Arc::clone(&self.reporter);

        let handle = thread::Builder::new()
            .name(format!("{}-acquire", self.id))
            .spawn(move || {
                let result = media.acquire(&constraints);
                attach_stream(&id, &core, generation, result, reporter.as_ref());
            })
            .map_err(|e| PhotoCamError::Spawn {
                task: "stream acquisition",
                reason: e.to_string(),
            })?;

        self.track_background(handle);
        Ok(())
    }

    fn stop_session(&self) {
        debug!(widget = %self.id, "stopping");
        self.release_resources();
    }

    fn release_resources(&self) {
        debug!(widget = %self.id, "cleanUp");

        let render = self.render.lock().take();
        if let Some(render) = render {
            render.cancel();
        }

        let canvas = {
            let mut core = self.core.lock();
            core.generation += 1;
            if core.state.is_active() {
                core.state = SessionState::Stopped;
            }
            core.stream_attached = false;
            core.canvas.take()
        };
        let Some(canvas) = canvas else {
            return;
        };

        let (released, surface) = {
            let mut canvas = canvas.lock();
            canvas.retired = true;
            (canvas.video.release(), canvas.surface.take())
        };
        match released {
            Ok(tracks) => debug!(widget = %self.id, tracks, "camera tracks stopped"),
            Err(e) => self.report(&e.into()),
        }
        if let Some(surface) = surface {
            if let Err(e) = self.host.destroy_surface(&self.id, surface) {
                self.report(&e.into());
            }
        }
    }

    fn capture_and_send(&self) -> Result<(), PhotoCamError> {
        let canvas = {
            let mut core = self.core.lock();
            if core.capturing {
                return Err(PhotoCamError::CaptureInProgress);
            }
            let canvas = match (core.state, core.canvas.as_ref()) {
                (SessionState::Running, Some(canvas)) => Arc::clone(canvas),
                _ => return Err(PhotoCamError::NotReady),
            };
            core.capturing = true;
            canvas
        };
        debug!(widget = %self.id, "capturing data");

        let guard = CaptureGuard::engaged(&self.core);
        // Waits for a draw that began before the flag was set.
        let snapshot = canvas.lock().surface.as_ref().map(|s| s.image().clone());
        let encoded = match snapshot {
            Some(image) => encode_surface(&image, &self.settings).map_err(PhotoCamError::from),
            None => Err(PhotoCamError::NotReady),
        };
        drop(guard);

        let captured = encoded?;
        self.stats.record_capture();
        debug!(
            widget = %self.id,
            captured_at = %captured.captured_at(),
            bytes = captured.byte_len(),
            width = captured.width(),
            height = captured.height(),
            "photo encoded"
        );
        self.dispatch(captured.data_url())
    }

    fn dispatch(&self, payload: &str) -> Result<(), PhotoCamError> {
        debug!(widget = %self.id, "sending data to backend");
        let request = AjaxRequest::for_capture(
            &self.id,
            self.settings.process.as_deref(),
            self.settings.update.as_deref(),
            payload,
        );
        self.dispatcher.dispatch(&request)?;
        self.stats.record_request_dispatched();
        Ok(())
    }
}

impl Drop for PhotoCam {
    fn drop(&mut self) {
        if !self.settings.disabled {
            self.release_resources();
        }
    }
}

impl std::fmt::Debug for PhotoCam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoCam")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish()
    }
}

/// Completes a background acquisition.
///
/// A stream that resolves after its session was cleaned up (or replaced)
/// is released immediately instead of being attached.
fn attach_stream(
    id: &str,
    core: &Mutex<SessionCore>,
    generation: u64,
    result: Result<Box<dyn MediaStream>, MediaError>,
    reporter: &dyn ErrorReporter,
) {
    let stream = match result {
        Ok(stream) => stream,
        Err(e) => {
            reporter.report(id, &e.into());
            return;
        }
    };

    let canvas = {
        let core = core.lock();
        let current = core.generation == generation;
        core.canvas.clone().filter(|_| current)
    };

    let attached = match canvas {
        Some(canvas) => {
            let mut canvas = canvas.lock();
            if canvas.retired {
                Err(stream)
            } else {
                let replaced = canvas.video.attach(stream);
                canvas.video.play();
                Ok(replaced)
            }
        }
        None => Err(stream),
    };

    match attached {
        Ok(replaced) => {
            {
                let mut core = core.lock();
                if core.generation == generation {
                    core.stream_attached = true;
                }
            }
            debug!(widget = id, generation, "stream attached");
            if let Err(e) = replaced {
                reporter.report(id, &e.into());
            }
        }
        Err(mut stream) => {
            debug!(widget = id, generation, "discarding stream resolved after cleanup");
            if let Err(e) = stream.stop_tracks() {
                reporter.report(id, &e.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{FacingMode, MockMedia};
    use crate::render::{DrawError, Surface};
    use crate::report::RecordingReporter;
    use crate::transport::RecordingDispatcher;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{OnceLock, Weak};
    use std::time::{Duration, Instant};

    struct Fixture {
        media: MockMedia,
        host: Arc<HeadlessHost>,
        dispatcher: Arc<RecordingDispatcher>,
        reporter: Arc<RecordingReporter>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_media(MockMedia::new())
        }

        fn with_media(media: MockMedia) -> Self {
            Self {
                media,
                host: Arc::new(HeadlessHost::with_container("cam")),
                dispatcher: Arc::new(RecordingDispatcher::new()),
                reporter: Arc::new(RecordingReporter::new()),
            }
        }

        fn widget(&self, config: PhotoCamConfig) -> PhotoCam {
            PhotoCam::builder("cam", Arc::new(self.media.clone()))
                .config(config)
                .host(self.host.clone())
                .dispatcher(self.dispatcher.clone())
                .reporter(self.reporter.clone())
                .init()
        }
    }

    fn manual() -> PhotoCamConfig {
        PhotoCamConfig {
            auto_start: Some(false),
            render_timeout: Some(5),
            ..Default::default()
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    #[test]
    fn test_auto_start() {
        let fixture = Fixture::new();
        let cam = fixture.widget(PhotoCamConfig {
            render_timeout: Some(5),
            ..Default::default()
        });

        assert!(cam.is_running());
        assert!(cam.has_surface());
        cam.wait_idle();

        assert!(cam.has_stream());
        assert_eq!(fixture.media.requests(), vec![StreamConstraints::Default]);
        assert_eq!(cam.devices().len(), 2);
        assert!(wait_for(|| cam.stats().frames_rendered() > 0));
        assert!(fixture.reporter.is_empty());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let fixture = Fixture::new();
        let cam = fixture.widget(manual());

        cam.stop();
        cam.stop();

        assert_eq!(cam.state(), SessionState::Idle);
        assert!(!cam.has_surface());
        assert_eq!(fixture.media.acquire_count(), 0);
        assert!(fixture.reporter.is_empty());
    }

    #[test]
    fn test_start_then_stop_releases_everything() {
        let fixture = Fixture::new();
        let cam = fixture.widget(manual());

        cam.start();
        cam.stop();
        cam.wait_idle();

        assert_eq!(cam.state(), SessionState::Stopped);
        assert!(!cam.has_surface());
        assert!(fixture.media.all_stopped());
        assert_eq!(fixture.host.attached("cam"), 0);

        let rendered = cam.stats().frames_rendered();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(cam.stats().frames_rendered(), rendered);
        assert_eq!(fixture.media.frames_read(), rendered);
    }

    #[test]
    fn test_late_stream_is_released_not_attached() {
        let fixture = Fixture::with_media(MockMedia::new().with_acquire_delay(Duration::from_millis(50)));
        let cam = fixture.widget(manual());

        cam.start();
        cam.stop();
        cam.wait_idle();

        assert_eq!(fixture.media.stream_count(), 1);
        assert!(fixture.media.all_stopped());
        assert!(!cam.has_stream());
        assert_eq!(cam.state(), SessionState::Stopped);
    }

    #[test]
    fn test_restart_when_not_running() {
        let fixture = Fixture::new();
        let cam = fixture.widget(manual());

        cam.restart();
        assert_eq!(fixture.media.acquire_count(), 0);
        assert_eq!(cam.state(), SessionState::Idle);

        cam.start();
        cam.stop();
        cam.restart();
        cam.wait_idle();
        assert_eq!(fixture.media.acquire_count(), 1);
        assert!(!cam.is_running());
    }

    #[test]
    fn test_restart_when_running() {
        let fixture = Fixture::new();
        let cam = fixture.widget(manual());

        cam.start();
        cam.wait_idle();
        cam.restart();
        cam.wait_idle();

        assert!(cam.is_running());
        assert!(cam.has_stream());
        assert_eq!(fixture.media.acquire_count(), 2);
        assert_eq!(fixture.media.stream_count(), 2);
        assert_eq!(fixture.media.stopped_count(), 1);
        assert_eq!(cam.stats().sessions_started(), 2);
        assert_eq!(fixture.host.attached("cam"), 1);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let fixture = Fixture::new();
        let cam = fixture.widget(manual());

        cam.start();
        cam.start();
        cam.wait_idle();

        assert_eq!(fixture.media.acquire_count(), 1);
        assert_eq!(cam.stats().sessions_started(), 1);
    }

    #[test]
    fn test_capture_when_not_running() {
        let fixture = Fixture::new();
        let cam = fixture.widget(manual());

        cam.capture();

        assert!(fixture.dispatcher.is_empty());
        assert_eq!(fixture.reporter.len(), 1);
        assert!(fixture.reporter.reports()[0].contains("not ready"));
        assert_eq!(cam.stats().capture_failures(), 1);
    }

    #[test]
    fn test_capture_sends_one_request() {
        let fixture = Fixture::new();
        let cam = fixture.widget(PhotoCamConfig {
            process: Some("form:name".to_string()),
            update: Some("preview".to_string()),
            ..manual()
        });

        cam.start();
        cam.wait_idle();
        cam.capture();

        let requests = fixture.dispatcher.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.source, "cam");
        assert_eq!(request.process, "cam form:name");
        assert_eq!(request.update.as_deref(), Some("preview"));
        assert_eq!(request.params.len(), 1);
        assert_eq!(request.params[0].name, "cam_data");
        assert!(request.params[0].value.starts_with("data:image/jpeg;base64,"));

        assert!(!cam.is_capturing());
        assert_eq!(cam.stats().captures(), 1);
        assert_eq!(cam.stats().requests_dispatched(), 1);
        assert!(fixture.reporter.is_empty());
    }

    #[test]
    fn test_transport_failure_reported() {
        let fixture = Fixture {
            dispatcher: Arc::new(RecordingDispatcher::failing()),
            ..Fixture::new()
        };
        let cam = fixture.widget(manual());

        cam.start();
        cam.capture();

        assert_eq!(fixture.dispatcher.len(), 1);
        assert_eq!(fixture.reporter.len(), 1);
        assert_eq!(cam.stats().requests_dispatched(), 0);
        assert!(!cam.is_capturing());
    }

    #[test]
    fn test_device_selection_constraints() {
        let cases = [
            (Some("user"), StreamConstraints::FacingMode(FacingMode::User)),
            (Some("environment"), StreamConstraints::FacingMode(FacingMode::Environment)),
            (Some("mock-cam-1"), StreamConstraints::DeviceId("mock-cam-1".to_string())),
            (None, StreamConstraints::Default),
        ];

        for (device, expected) in cases {
            let fixture = Fixture::new();
            let cam = fixture.widget(PhotoCamConfig {
                device: device.map(str::to_string),
                ..manual()
            });
            cam.start();
            cam.wait_idle();

            assert_eq!(fixture.media.requests(), vec![expected], "device {device:?}");
            assert!(cam.has_stream());
        }
    }

    #[test]
    fn test_missing_container_reported() {
        let fixture = Fixture {
            host: Arc::new(HeadlessHost::new()),
            ..Fixture::new()
        };
        let cam = fixture.widget(manual());

        cam.start();

        assert_eq!(cam.state(), SessionState::Idle);
        assert!(!cam.has_surface());
        assert_eq!(fixture.media.acquire_count(), 0);
        assert_eq!(fixture.reporter.len(), 1);
    }

    #[test]
    fn test_unsupported_media_stays_idle() {
        let fixture = Fixture::with_media(MockMedia::new().without_user_media());
        let cam = fixture.widget(PhotoCamConfig::default());

        cam.wait_idle();
        assert_eq!(cam.state(), SessionState::Idle);
        assert!(!cam.has_surface());
        assert!(fixture.reporter.is_empty());
    }

    #[test]
    fn test_enumeration_unsupported_reported() {
        let fixture = Fixture::with_media(MockMedia::new().without_enumeration());
        let cam = fixture.widget(manual());

        cam.wait_idle();
        assert!(cam.devices().is_empty());
        assert_eq!(fixture.reporter.len(), 1);
        assert!(fixture.reporter.reports()[0].contains("enumeration"));
    }

    #[test]
    fn test_device_list_is_additive() {
        let fixture = Fixture::new();
        let cam = fixture.widget(manual());
        cam.wait_idle();

        let ids: Vec<_> = cam.devices().into_iter().map(|d| d.device_id).collect();
        assert_eq!(ids, vec!["mock-cam-0", "mock-cam-1"]);

        cam.load_device_list();
        cam.wait_idle();
        assert_eq!(cam.devices().len(), 4);
        assert_eq!(cam.stats().devices_discovered(), 4);
    }

    #[test]
    fn test_disabled_widget_does_nothing() {
        let fixture = Fixture::new();
        let cam = fixture.widget(PhotoCamConfig {
            disabled: Some(true),
            ..Default::default()
        });

        cam.start();
        cam.capture();
        cam.load_device_list();
        cam.wait_idle();

        assert_eq!(cam.state(), SessionState::Idle);
        assert_eq!(fixture.media.acquire_count(), 0);
        assert!(cam.devices().is_empty());
        assert!(fixture.dispatcher.is_empty());
        assert!(fixture.reporter.is_empty());
    }

    #[test]
    fn test_track_stop_failure_still_cleans_up() {
        let fixture = Fixture::with_media(MockMedia::new().failing_track_stop());
        let cam = fixture.widget(manual());

        cam.start();
        cam.wait_idle();
        cam.stop();

        assert_eq!(fixture.reporter.len(), 1);
        assert!(!cam.has_surface());
        assert_eq!(fixture.host.attached("cam"), 0);
        assert_eq!(cam.state(), SessionState::Stopped);
    }

    #[test]
    fn test_detach_failure_still_cleans_up() {
        let fixture = Fixture {
            host: Arc::new(HeadlessHost::with_container("cam").failing_detach()),
            ..Fixture::new()
        };
        let cam = fixture.widget(manual());

        cam.start();
        cam.wait_idle();
        cam.stop();

        assert_eq!(fixture.reporter.len(), 1);
        assert!(!cam.has_surface());
        assert!(fixture.media.all_stopped());
    }

    #[test]
    fn test_acquisition_failure_reported() {
        let fixture = Fixture::with_media(MockMedia::new().failing_acquire());
        let cam = fixture.widget(manual());

        cam.start();
        cam.wait_idle();

        assert_eq!(fixture.reporter.len(), 1);
        assert!(cam.is_running());
        assert!(!cam.has_stream());

        cam.stop();
        assert!(!cam.has_surface());
    }

    #[test]
    fn test_drop_releases_camera() {
        let fixture = Fixture::new();
        let cam = fixture.widget(manual());
        cam.start();
        cam.wait_idle();

        drop(cam);
        assert_eq!(fixture.media.stream_count(), 1);
        assert!(fixture.media.all_stopped());
        assert_eq!(fixture.host.attached("cam"), 0);
    }

    #[test]
    fn test_custom_image_handler() {
        let fixture = Fixture::new();
        let draws = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&draws);
        let handler = move |_: &mut VideoSink, _: &mut Surface| -> Result<(), DrawError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        let cam = PhotoCam::builder("cam", Arc::new(fixture.media.clone()))
            .config(manual())
            .host(fixture.host.clone())
            .image_handler(Arc::new(handler))
            .init();
        cam.start();
        cam.wait_idle();

        assert!(wait_for(|| draws.load(Ordering::SeqCst) > 0));
        assert_eq!(fixture.media.frames_read(), 0);
    }

    #[test]
    fn test_oversized_dimensions_reported() {
        let fixture = Fixture::new();
        let cam = fixture.widget(PhotoCamConfig {
            width: Some(u32::MAX),
            height: Some(u32::MAX),
            ..manual()
        });
        assert_eq!(cam.settings().width, crate::config::MAX_DIMENSION);

        cam.start();

        assert_eq!(cam.state(), SessionState::Idle);
        assert!(!cam.has_surface());
        assert_eq!(fixture.host.attached("cam"), 0);
        assert_eq!(fixture.reporter.len(), 1);
        assert!(fixture.reporter.reports()[0].starts_with("cam: surface of"));

        let fixture = Fixture::new();
        let cam = fixture.widget(PhotoCamConfig {
            width: Some(64),
            height: Some(48),
            photo_width: Some(u32::MAX),
            photo_height: Some(u32::MAX),
            ..manual()
        });
        cam.start();
        cam.wait_idle();
        cam.capture();

        assert!(cam.is_running());
        assert!(!cam.is_capturing());
        assert!(fixture.dispatcher.is_empty());
        assert_eq!(cam.stats().capture_failures(), 1);
        assert_eq!(fixture.reporter.len(), 1);
        assert!(fixture.reporter.reports()[0].contains("exceeds the allocation limit"));
        cam.stop();
    }

    #[test]
    fn test_image_handler_can_query_widget() {
        let fixture = Fixture::new();
        let widget: Arc<OnceLock<Weak<PhotoCam>>> = Arc::new(OnceLock::new());
        let queried = Arc::new(AtomicUsize::new(0));

        let handler = {
            let widget = Arc::clone(&widget);
            let queried = Arc::clone(&queried);
            move |video: &mut VideoSink, surface: &mut Surface| -> Result<(), DrawError> {
                if let Some(cam) = widget.get().and_then(Weak::upgrade) {
                    if cam.is_running() && cam.has_surface() && !cam.is_capturing() {
                        queried.fetch_add(1, Ordering::SeqCst);
                    }
                }
                DrawFullFrame.draw(video, surface)
            }
        };

        let cam = Arc::new(
            PhotoCam::builder("cam", Arc::new(fixture.media.clone()))
                .config(manual())
                .host(fixture.host.clone())
                .reporter(fixture.reporter.clone())
                .image_handler(Arc::new(handler))
                .init(),
        );
        assert!(widget.set(Arc::downgrade(&cam)).is_ok());

        cam.start();
        cam.wait_idle();
        assert!(wait_for(|| queried.load(Ordering::SeqCst) > 0));
        assert!(cam.has_stream());

        cam.stop();
        assert!(fixture.media.all_stopped());
        assert!(fixture.reporter.is_empty());
    }
}
