//! Request dispatch: endpoint selection, failover and the worker redirect.
//!
//! ## Flow
//! 1. Materialize the [`RequestTemplate`] against [`EndpointPool::current`].
//! 2. Send. A transport failure that another endpoint could cure advances the
//!    pool and tries again, at most once per endpoint. Any HTTP status ends the
//!    loop; non-2xx replies are the protocol layer's business.
//! 3. On `307 Temporary Redirect`, replay the same method, headers and body to
//!    the `Location` URL exactly once, outside the failover loop. A second
//!    redirect is an error.
//!
//! The body lives in the template as an owned buffer filled before the first
//! attempt, so it can be sent any number of times.

use crate::endpoint::EndpointPool;
use crate::error::{Operation, Result, StreamLoadError};
use crate::transport::{
    Headers, HttpRequest, HttpResponse, Method, Transport, TransportError, TransportErrorKind,
};
use log::{debug, warn};

/// An endpoint-independent request.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub method: Method,
    /// Absolute path starting with `/`.
    pub path: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RequestTemplate {
    pub fn new(method: Method, path: impl Into<String>, headers: Headers) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    fn bind<'a>(&'a self, url: &'a str) -> HttpRequest<'a> {
        HttpRequest {
            method: self.method,
            url,
            headers: &self.headers,
            body: &self.body,
        }
    }
}

/// Sends templates through a transport against a pool.
pub struct Dispatcher<'a> {
    pool: &'a EndpointPool,
    transport: &'a dyn Transport,
}

impl<'a> Dispatcher<'a> {
    pub fn new(pool: &'a EndpointPool, transport: &'a dyn Transport) -> Self {
        Self { pool, transport }
    }

    /// Send `template`, failing over between endpoints and following one redirect.
    ///
    /// # Errors
    ///
    /// - [`StreamLoadError::Transport`] when every endpoint failed, carrying the last error
    /// - [`StreamLoadError::MissingLocation`] for a redirect without a target
    /// - [`StreamLoadError::RedirectTransport`] when the redirected request failed
    /// - [`StreamLoadError::RedirectLoop`] when the redirect target redirects again
    pub fn dispatch(&self, operation: Operation, template: &RequestTemplate) -> Result<HttpResponse> {
        let response = self.send_with_failover(operation, template)?;
        if response.is_redirect() {
            return self.follow_redirect(operation, template, &response);
        }
        Ok(response)
    }

    fn send_with_failover(
        &self,
        operation: Operation,
        template: &RequestTemplate,
    ) -> Result<HttpResponse> {
        let max_attempts = self.pool.len();
        let mut last_err: Option<TransportError> = None;

        for attempt in 1..=max_attempts {
            let url = format!("{}{}", self.pool.current().base_url(), template.path);
            debug!(
                "{operation}: attempt {attempt}/{max_attempts}: {} {url}",
                template.method
            );

            match self.transport.send(&template.bind(&url)) {
                Ok(response) => {
                    debug!("{operation}: {url} answered HTTP {}", response.status);
                    return Ok(response);
                }
                Err(err) if !err.kind().allows_failover() => {
                    return Err(StreamLoadError::Transport {
                        operation,
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    warn!("{operation}: {url} failed: {err}");
                    last_err = Some(err);
                    self.pool.advance();
                }
            }
        }

        // The pool is never empty, so the loop ran at least once.
        let source = last_err.unwrap_or_else(|| {
            TransportError::new(TransportErrorKind::Other, "no endpoint attempted")
        });
        Err(StreamLoadError::Transport {
            operation,
            attempts: max_attempts,
            source,
        })
    }

    fn follow_redirect(
        &self,
        operation: Operation,
        template: &RequestTemplate,
        redirect: &HttpResponse,
    ) -> Result<HttpResponse> {
        let location = redirect
            .header("Location")
            .filter(|l| !l.is_empty())
            .ok_or(StreamLoadError::MissingLocation { operation })?;

        debug!(
            "{operation}: redirected to {location}, replaying {} body bytes",
            template.body.len()
        );

        let response = self
            .transport
            .send(&template.bind(location))
            .map_err(|source| StreamLoadError::RedirectTransport {
                operation,
                location: location.to_string(),
                source,
            })?;
        if response.is_redirect() {
            return Err(StreamLoadError::RedirectLoop {
                operation,
                location: location.to_string(),
            });
        }
        Ok(response)
    }
}
