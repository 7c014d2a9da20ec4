//! Prometheus metrics for a PhotoCam widget.
//!
//! # Metrics Exposed
//!
//! - `photocam_session_state` - Lifecycle state code
//! - `photocam_stream_attached` - Whether a camera stream is attached
//! - `photocam_sessions_started_total` - Sessions started
//! - `photocam_frames_rendered_total` - Frames drawn by the render loop
//! - `photocam_ticks_skipped_total` - Render ticks that drew nothing
//! - `photocam_captures_total` - Successful captures
//! - `photocam_capture_failures_total` - Failed capture attempts
//! - `photocam_requests_dispatched_total` - Requests sent to the dispatcher
//! - `photocam_devices_discovered` - Video input devices discovered
//!
//! # Example
//!
//! ```no_run
//! use photocam::media::MockMedia;
//! use photocam::metrics::{MetricsRegistry, MetricsSnapshot};
//! use photocam::PhotoCam;
//! use std::sync::Arc;
//!
//! let cam = PhotoCam::builder("cam", Arc::new(MockMedia::new())).init();
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! registry.update(&MetricsSnapshot::from_widget(&cam));
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
