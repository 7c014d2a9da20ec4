//! The camera session: lifecycle, render loop wiring, capture and devices.
//!
//! ```text
//! Idle ──start──▶ Starting ──▶ Running ──stop/clean_up──▶ Stopped
//!                                 ▲                          │
//!                                 └────────── start ─────────┘
//! ```

mod error;
mod photocam;
mod state;
mod stats;

pub use error::PhotoCamError;
pub use photocam::{PhotoCam, PhotoCamBuilder};
pub use state::SessionState;
pub use stats::SessionStats;
