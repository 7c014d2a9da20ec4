//! The host error channel.
//!
//! Lifecycle operations never return errors to their caller. Failures
//! that the host should hear about are handed to an [`ErrorReporter`].

use crate::session::PhotoCamError;
use parking_lot::Mutex;

/// Receives errors raised by a widget.
pub trait ErrorReporter: Send + Sync {
    /// Reports one error raised by widget `widget`.
    fn report(&self, widget: &str, error: &PhotoCamError);
}

/// Logs reported errors through `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, widget: &str, error: &PhotoCamError) {
        tracing::error!(widget, error = %error, "photocam error");
    }
}

/// Collects reported errors as display strings.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<String>>,
}

impl RecordingReporter {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far.
    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().clone()
    }

    /// Number of reports received.
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// Whether nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, widget: &str, error: &PhotoCamError) {
        self.reports.lock().push(format!("{widget}: {error}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter() {
        let reporter = RecordingReporter::new();
        reporter.report("cam", &PhotoCamError::NotReady);

        assert_eq!(reporter.len(), 1);
        assert!(reporter.reports()[0].starts_with("cam: "));
    }
}
