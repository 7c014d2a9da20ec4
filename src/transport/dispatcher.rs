//! The request-dispatch collaborator.

use super::AjaxRequest;
use parking_lot::Mutex;
use thiserror::Error;

/// Errors raised while dispatching a request.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    #[error("http request failed: {0}")]
    Http(String),
}

/// Hands requests to the server-side component model.
///
/// One call per capture; implementations do not retry or batch.
pub trait Dispatcher: Send + Sync {
    /// Sends one request.
    fn dispatch(&self, request: &AjaxRequest) -> Result<(), TransportError>;
}

/// Logs each request instead of sending it.
#[derive(Debug, Default)]
pub struct LogDispatcher;

impl Dispatcher for LogDispatcher {
    fn dispatch(&self, request: &AjaxRequest) -> Result<(), TransportError> {
        let payload_len: usize = request.params.iter().map(|p| p.value.len()).sum();
        tracing::info!(
            source = %request.source,
            process = %request.process,
            update = request.update.as_deref().unwrap_or(""),
            payload_len,
            "request dispatched"
        );
        Ok(())
    }
}

/// Keeps every dispatched request in memory.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    requests: Mutex<Vec<AjaxRequest>>,
    fail: bool,
}

impl RecordingDispatcher {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that records and then rejects every request.
    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<AjaxRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests seen so far.
    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    /// Whether no request has been seen.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, request: &AjaxRequest) -> Result<(), TransportError> {
        self.requests.lock().push(request.clone());
        if self.fail {
            return Err(TransportError::Dispatch("recorder set to fail".to_string()));
        }
        Ok(())
    }
}
