//! Metrics collection and registry.

use crate::session::PhotoCam;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of widget state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Lifecycle state code (0 idle, 1 starting, 2 running, 3 stopped).
    pub state: i64,
    /// Whether a stream is attached to the video sink.
    pub stream_attached: bool,
    /// Sessions started.
    pub sessions_started: u64,
    /// Frames drawn by the render loop.
    pub frames_rendered: u64,
    /// Render ticks that drew nothing.
    pub ticks_skipped: u64,
    /// Successful captures.
    pub captures: u64,
    /// Failed capture attempts.
    pub capture_failures: u64,
    /// Requests handed to the dispatcher.
    pub requests_dispatched: u64,
    /// Video input devices discovered.
    pub devices_discovered: u64,
}

impl MetricsSnapshot {
    /// Reads the current counters of a widget.
    pub fn from_widget(widget: &PhotoCam) -> Self {
        let stats = widget.stats();
        Self {
            state: widget.state().code(),
            stream_attached: widget.has_stream(),
            sessions_started: stats.sessions_started(),
            frames_rendered: stats.frames_rendered(),
            ticks_skipped: stats.ticks_skipped(),
            captures: stats.captures(),
            capture_failures: stats.capture_failures(),
            requests_dispatched: stats.requests_dispatched(),
            devices_discovered: stats.devices_discovered(),
        }
    }
}

/// Prometheus metrics registry for a PhotoCam widget.
pub struct MetricsRegistry {
    registry: Registry,

    // Session metrics
    session_state: IntGauge,
    stream_attached: IntGauge,
    sessions_started: IntCounter,

    // Render loop metrics
    frames_rendered: IntCounter,
    ticks_skipped: IntCounter,

    // Capture and transport metrics
    captures: IntCounter,
    capture_failures: IntCounter,
    requests_dispatched: IntCounter,

    devices_discovered: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all widget metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let session_state = IntGauge::new(
            "photocam_session_state",
            "Session state (0=idle, 1=starting, 2=running, 3=stopped)",
        )?;
        let stream_attached = IntGauge::new(
            "photocam_stream_attached",
            "Whether a camera stream is attached (1) or not (0)",
        )?;
        let sessions_started = IntCounter::new(
            "photocam_sessions_started_total",
            "Total camera sessions started",
        )?;
        let frames_rendered = IntCounter::new(
            "photocam_frames_rendered_total",
            "Total frames drawn by the render loop",
        )?;
        let ticks_skipped = IntCounter::new(
            "photocam_ticks_skipped_total",
            "Total render ticks that drew nothing",
        )?;
        let captures = IntCounter::new("photocam_captures_total", "Total successful captures")?;
        let capture_failures = IntCounter::new(
            "photocam_capture_failures_total",
            "Total failed capture attempts",
        )?;
        let requests_dispatched = IntCounter::new(
            "photocam_requests_dispatched_total",
            "Total requests handed to the dispatcher",
        )?;
        let devices_discovered = IntGauge::new(
            "photocam_devices_discovered",
            "Video input devices discovered",
        )?;

        registry.register(Box::new(session_state.clone()))?;
        registry.register(Box::new(stream_attached.clone()))?;
        registry.register(Box::new(sessions_started.clone()))?;
        registry.register(Box::new(frames_rendered.clone()))?;
        registry.register(Box::new(ticks_skipped.clone()))?;
        registry.register(Box::new(captures.clone()))?;
        registry.register(Box::new(capture_failures.clone()))?;
        registry.register(Box::new(requests_dispatched.clone()))?;
        registry.register(Box::new(devices_discovered.clone()))?;

        Ok(Self {
            registry,
            session_state,
            stream_attached,
            sessions_started,
            frames_rendered,
            ticks_skipped,
            captures,
            capture_failures,
            requests_dispatched,
            devices_discovered,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.session_state.set(snapshot.state);
        self.stream_attached.set(i64::from(snapshot.stream_attached));
        self.devices_discovered.set(snapshot.devices_discovered as i64);

        // Counters only move forward by the difference
        advance(&self.sessions_started, snapshot.sessions_started);
        advance(&self.frames_rendered, snapshot.frames_rendered);
        advance(&self.ticks_skipped, snapshot.ticks_skipped);
        advance(&self.captures, snapshot.captures);
        advance(&self.capture_failures, snapshot.capture_failures);
        advance(&self.requests_dispatched, snapshot.requests_dispatched);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhotoCamConfig;
    use crate::media::MockMedia;
    use std::sync::Arc;

    #[test]
    fn test_registry_creation() {
        assert!(MetricsRegistry::new().is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();
        let snapshot = MetricsSnapshot {
            state: 2,
            stream_attached: true,
            sessions_started: 1,
            frames_rendered: 40,
            captures: 3,
            ..Default::default()
        };

        registry.update(&snapshot);
        // Counters never go backwards
        registry.update(&MetricsSnapshot::default());

        let output = registry.encode().unwrap();
        assert!(output.contains("photocam_session_state 0"));
        assert!(output.contains("photocam_frames_rendered_total 40"));
        assert!(output.contains("photocam_captures_total 3"));
    }

    #[test]
    fn test_snapshot_from_widget() {
        let cam = PhotoCam::builder("cam", Arc::new(MockMedia::new()))
            .config(PhotoCamConfig {
                auto_start: Some(false),
                ..Default::default()
            })
            .init();
        cam.wait_idle();

        let snapshot = MetricsSnapshot::from_widget(&cam);
        assert_eq!(snapshot.state, 0);
        assert!(!snapshot.stream_attached);
        assert_eq!(snapshot.devices_discovered, 2);
    }
}
