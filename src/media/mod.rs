//! Camera access: streams, devices and the device-selection policy.
//!
//! The rest of the crate only sees the [`MediaCapability`] and
//! [`MediaStream`] traits. [`MockMedia`] is always available; the
//! `camera` feature adds [`NativeMedia`] for real hardware.

mod capability;
mod frame;
mod mock;
#[cfg(feature = "camera")]
mod native;

pub use capability::{
    DeviceDescriptor, DeviceKind, FacingMode, MediaCapability, MediaError, MediaStream,
    StreamConstraints,
};
pub use frame::Frame;
pub use mock::MockMedia;
#[cfg(feature = "camera")]
pub use native::NativeMedia;
