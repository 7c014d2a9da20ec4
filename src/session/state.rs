//! Session state shared by the widget, its render loop and acquisition.

use super::SessionStats;
use crate::render::{ImageHandler, Surface, VideoSink};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Lifecycle state of a camera session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Never started.
    Idle,
    /// Resources are being created.
    Starting,
    /// Camera active, render loop ticking.
    Running,
    /// Resources released; may start again.
    Stopped,
}

impl SessionState {
    /// Whether the session holds camera resources.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }

    /// Numeric code exported as a metric.
    pub fn code(self) -> i64 {
        match self {
            Self::Idle => 0,
            Self::Starting => 1,
            Self::Running => 2,
            Self::Stopped => 3,
        }
    }
}

/// Video sink and drawing surface of one session.
///
/// Locked separately from [`SessionCore`] so image handlers draw without
/// holding the session lock. Lock order: never take the session lock while
/// holding a canvas.
#[derive(Debug)]
pub(crate) struct Canvas {
    pub(crate) video: VideoSink,
    pub(crate) surface: Option<Surface>,
    /// Set when the owning session released the canvas; a late stream must
    /// not be attached to it.
    pub(crate) retired: bool,
}

impl Canvas {
    pub(crate) fn shared(video: VideoSink, surface: Surface) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            video,
            surface: Some(surface),
            retired: false,
        }))
    }
}

/// Mutable session record. `canvas` is present exactly while the state
/// is active.
#[derive(Debug)]
pub(crate) struct SessionCore {
    pub(crate) state: SessionState,
    pub(crate) capturing: bool,
    /// Bumped on every start and cleanup; stale acquisitions compare
    /// against it.
    pub(crate) generation: u64,
    pub(crate) stream_attached: bool,
    pub(crate) canvas: Option<Arc<Mutex<Canvas>>>,
}

impl SessionCore {
    pub(crate) fn new() -> Self {
        Self {
            state: SessionState::Idle,
            capturing: false,
            generation: 0,
            stream_attached: false,
            canvas: None,
        }
    }
}

/// Result of one render loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Drawn,
    SkippedCapturing,
    SkippedInactive,
    SkippedNotReady,
    DrawFailed,
}

/// Runs one render loop tick against the session.
///
/// The session lock is released before the image handler runs.
pub(crate) fn render_tick(
    core: &Mutex<SessionCore>,
    handler: &dyn ImageHandler,
    stats: &SessionStats,
) -> TickOutcome {
    let canvas = {
        let core = core.lock();
        if core.capturing {
            Err(TickOutcome::SkippedCapturing)
        } else if core.state != SessionState::Running {
            Err(TickOutcome::SkippedInactive)
        } else {
            core.canvas.clone().ok_or(TickOutcome::SkippedNotReady)
        }
    };

    let outcome = match canvas {
        Err(skipped) => skipped,
        Ok(canvas) => {
            let mut canvas = canvas.lock();
            let Canvas {
                video,
                surface,
                retired,
            } = &mut *canvas;
            match surface.as_mut() {
                Some(surface) if !*retired && video.is_ready() => match handler.draw(video, surface) {
                    Ok(()) => TickOutcome::Drawn,
                    Err(e) => {
                        tracing::trace!(error = %e, "image handler failed");
                        TickOutcome::DrawFailed
                    }
                },
                _ => TickOutcome::SkippedNotReady,
            }
        }
    };

    match outcome {
        TickOutcome::Drawn => stats.record_frame_rendered(),
        _ => stats.record_tick_skipped(),
    }
    outcome
}

/// Clears the capture flag when dropped, whether or not encoding succeeded.
pub(crate) struct CaptureGuard<'a> {
    core: &'a Mutex<SessionCore>,
}

impl<'a> CaptureGuard<'a> {
    /// Wraps a session whose capture flag the caller has just set.
    pub(crate) fn engaged(core: &'a Mutex<SessionCore>) -> Self {
        Self { core }
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.core.lock().capturing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaCapability, MockMedia, StreamConstraints};
    use crate::render::DrawError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn running_core(media: &MockMedia) -> Mutex<SessionCore> {
        let mut video = VideoSink::new(16, 12);
        video
            .attach(media.acquire(&StreamConstraints::Default).unwrap())
            .unwrap();
        video.play();

        let mut core = SessionCore::new();
        core.state = SessionState::Running;
        core.stream_attached = true;
        core.canvas = Some(Canvas::shared(video, Surface::new(16, 12)));
        Mutex::new(core)
    }

    #[derive(Default)]
    struct CountingHandler(AtomicUsize);

    impl ImageHandler for CountingHandler {
        fn draw(&self, _: &mut VideoSink, _: &mut Surface) -> Result<(), DrawError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_tick_draws_when_running() {
        let core = running_core(&MockMedia::new());
        let handler = CountingHandler::default();
        let stats = SessionStats::default();

        assert_eq!(render_tick(&core, &handler, &stats), TickOutcome::Drawn);
        assert_eq!(handler.0.load(Ordering::SeqCst), 1);
        assert_eq!(stats.frames_rendered(), 1);
    }

    #[test]
    fn test_tick_skipped_while_capturing() {
        let core = running_core(&MockMedia::new());
        core.lock().capturing = true;
        let handler = CountingHandler::default();
        let stats = SessionStats::default();

        for _ in 0..3 {
            assert_eq!(render_tick(&core, &handler, &stats), TickOutcome::SkippedCapturing);
        }
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
        assert_eq!(stats.ticks_skipped(), 3);
    }

    #[test]
    fn test_tick_skipped_before_stream_ready() {
        let core = running_core(&MockMedia::new());
        core.lock().canvas = Some(Canvas::shared(VideoSink::new(16, 12), Surface::new(16, 12)));
        let handler = CountingHandler::default();

        assert_eq!(
            render_tick(&core, &handler, &SessionStats::default()),
            TickOutcome::SkippedNotReady
        );
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_tick_skipped_when_stopped() {
        let core = running_core(&MockMedia::new());
        core.lock().state = SessionState::Stopped;
        let handler = CountingHandler::default();

        assert_eq!(
            render_tick(&core, &handler, &SessionStats::default()),
            TickOutcome::SkippedInactive
        );
    }

    struct QueryingHandler<'a> {
        core: &'a Mutex<SessionCore>,
        running: AtomicUsize,
    }

    impl ImageHandler for QueryingHandler<'_> {
        fn draw(&self, _: &mut VideoSink, _: &mut Surface) -> Result<(), DrawError> {
            if self.core.lock().state == SessionState::Running {
                self.running.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    #[test]
    fn test_handler_can_read_session_while_drawing() {
        let core = running_core(&MockMedia::new());
        let handler = QueryingHandler {
            core: &core,
            running: AtomicUsize::new(0),
        };

        assert_eq!(
            render_tick(&core, &handler, &SessionStats::default()),
            TickOutcome::Drawn
        );
        assert_eq!(handler.running.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tick_skips_retired_canvas() {
        let core = running_core(&MockMedia::new());
        if let Some(canvas) = core.lock().canvas.as_ref() {
            canvas.lock().retired = true;
        }
        let handler = CountingHandler::default();

        assert_eq!(
            render_tick(&core, &handler, &SessionStats::default()),
            TickOutcome::SkippedNotReady
        );
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_capture_guard_clears_flag() {
        let core = Mutex::new(SessionCore::new());
        core.lock().capturing = true;
        {
            let _guard = CaptureGuard::engaged(&core);
            assert!(core.lock().capturing);
        }
        assert!(!core.lock().capturing);
    }

    #[test]
    fn test_state_activity() {
        assert!(SessionState::Running.is_active());
        assert!(SessionState::Starting.is_active());
        assert!(!SessionState::Stopped.is_active());
        assert!(!SessionState::Idle.is_active());
    }
}
