//! Widget configuration.
//!
//! Raw options are accepted exactly as a page or config file spells them
//! and normalized once, at initialization, into immutable [`Settings`].

mod file;
mod options;

pub use file::{ConfigError, FileConfig, RuntimeConfig};
pub use options::{
    within_pixel_budget, ImageFormat, PhotoCamConfig, Settings, MAX_DIMENSION, MAX_PIXELS,
};
