//! Per-widget activity counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the session, render loop and capture path.
#[derive(Debug, Default)]
pub struct SessionStats {
    sessions_started: AtomicU64,
    frames_rendered: AtomicU64,
    ticks_skipped: AtomicU64,
    captures: AtomicU64,
    capture_failures: AtomicU64,
    requests_dispatched: AtomicU64,
    devices_discovered: AtomicU64,
}

macro_rules! counter {
    ($field:ident, $bump:ident) => {
        pub(crate) fn $bump(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }

        #[doc = concat!("Current value of `", stringify!($field), "`.")]
        pub fn $field(&self) -> u64 {
            self.$field.load(Ordering::Relaxed)
        }
    };
}

impl SessionStats {
    counter!(sessions_started, record_session_started);
    counter!(frames_rendered, record_frame_rendered);
    counter!(ticks_skipped, record_tick_skipped);
    counter!(captures, record_capture);
    counter!(capture_failures, record_capture_failure);
    counter!(requests_dispatched, record_request_dispatched);
    counter!(devices_discovered, record_device_discovered);
}
