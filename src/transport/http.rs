//! Form-post dispatcher for a faces endpoint.

use super::{AjaxRequest, Dispatcher, TransportError};
use std::time::Duration;

/// Posts each request as `application/x-www-form-urlencoded`.
#[derive(Debug)]
pub struct HttpDispatcher {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpDispatcher {
    /// Creates a dispatcher for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }

    /// Target URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Dispatcher for HttpDispatcher {
    fn dispatch(&self, request: &AjaxRequest) -> Result<(), TransportError> {
        let form = request.to_form();
        let fields: Vec<(&str, &str)> = form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Faces-Request", "partial/ajax")
            .send_form(&fields)
            .map_err(|e| TransportError::Http(e.to_string()))?;

        tracing::info!(
            endpoint = %self.endpoint,
            status = response.status(),
            source = %request.source,
            "capture posted"
        );
        Ok(())
    }
}
