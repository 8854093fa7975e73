//! Blocking HTTP transport built on `ureq`.
//!
//! The agent is configured so that:
//! - redirects are returned to the caller instead of being followed
//! - HTTP error statuses come back as responses, not errors
//! - a single global timeout bounds each request

use crate::transport::traits::{
    Headers, HttpRequest, HttpResponse, Transport, TransportError, TransportErrorKind,
    TransportResult,
};
use std::time::Duration;
use ureq::Agent;

/// Default per-request timeout, long enough for multi-gigabyte loads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .build()
            .into();
        Self { agent }
    }

    /// Wrap an agent the caller configured; it must not follow redirects.
    #[must_use]
    pub const fn from_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest<'_>) -> TransportResult<HttpResponse> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        let http_request = builder.body(request.body).map_err(|e| {
            TransportError::new(
                TransportErrorKind::InvalidRequest,
                format!("build {} {}", request.method, request.url),
            )
            .with_source(e)
        })?;

        let mut response = self.agent.run(http_request).map_err(classify)?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.body_mut().read_to_vec().map_err(|e| {
            TransportError::new(
                TransportErrorKind::ResponseBody,
                format!("read response body from {} (HTTP {status})", request.url),
            )
            .with_source(e)
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed | ureq::Error::Io(_) => {
            TransportErrorKind::Connect
        }
        ureq::Error::Http(_) | ureq::Error::BadUri(_) => TransportErrorKind::InvalidRequest,
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string()).with_source(err)
}
