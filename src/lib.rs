//! PhotoCam
//!
//! A camera widget that shows a live preview, captures still images on
//! demand and hands each capture to a server-side component model.
//!
//! # Architecture
//!
//! ```text
//! media (stream, devices) → render (sink, surface, loop) → capture → transport
//!            ↑                                                   ↓
//!            └──────────── session (lifecycle, cleanup) ─────────┘
//! ```
//!
//! Platform services are injected as capabilities: a [`MediaCapability`]
//! for streams and devices, a [`SurfaceHost`] for drawing surfaces, a
//! [`Dispatcher`] for outbound requests and an [`ErrorReporter`] for the
//! host error channel.
//!
//! # Example
//!
//! ```no_run
//! use photocam::{
//!     config::PhotoCamConfig,
//!     media::MockMedia,
//!     transport::RecordingDispatcher,
//!     PhotoCam,
//! };
//! use std::sync::Arc;
//!
//! let dispatcher = Arc::new(RecordingDispatcher::new());
//! let cam = PhotoCam::builder("form:cam", Arc::new(MockMedia::new()))
//!     .config(PhotoCamConfig {
//!         update: Some("preview".to_string()),
//!         ..Default::default()
//!     })
//!     .dispatcher(dispatcher.clone())
//!     .init();
//!
//! cam.wait_idle();
//! cam.capture();
//! assert_eq!(dispatcher.len(), 1);
//!
//! cam.stop();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod media;
pub mod metrics;
pub mod render;
pub mod report;
pub mod session;
pub mod transport;

// Re-export commonly used types at crate root
pub use capture::CapturedImage;
pub use config::{FileConfig, ImageFormat, PhotoCamConfig, Settings};
pub use media::{DeviceDescriptor, MediaCapability, MockMedia, StreamConstraints};
pub use render::{HeadlessHost, ImageHandler, SurfaceHost};
pub use report::ErrorReporter;
pub use session::{PhotoCam, PhotoCamError, SessionState};
pub use transport::{AjaxRequest, Dispatcher};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
