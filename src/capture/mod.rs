//! Still capture: turning the drawing surface into a transmittable image.

mod encode;

pub use encode::{encode_surface, CapturedImage, EncodeError};
