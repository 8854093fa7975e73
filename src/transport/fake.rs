//! Scripted in-memory transport for tests.
//!
//! Replies are queued per origin (`http://host:port`) and handed out in order.
//! Every request is recorded with its full header set and body so tests can
//! assert exactly what went over the wire. An origin with an empty queue
//! behaves like a closed port.

use crate::transport::traits::{
    Headers, HttpRequest, HttpResponse, Method, Transport, TransportError, TransportErrorKind,
    TransportResult,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// A request as the fake saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// `scheme://host:port` of the request URL.
    #[must_use]
    pub fn origin(&self) -> &str {
        origin_of(&self.url)
    }
}

enum Scripted {
    Respond(HttpResponse),
    Fail(TransportErrorKind, String),
}

#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request to `origin`.
    pub fn respond(&self, origin: &str, response: HttpResponse) {
        self.push(origin, Scripted::Respond(response));
    }

    /// Queue a JSON response body with the given status.
    pub fn respond_json(&self, origin: &str, status: u16, body: &Value) {
        self.respond(origin, HttpResponse::new(status, body.to_string()));
    }

    /// Queue a `307 Temporary Redirect` pointing at `location`.
    pub fn redirect(&self, origin: &str, location: &str) {
        self.respond(
            origin,
            HttpResponse::new(307, Vec::new()).with_header("Location", location),
        );
    }

    /// Queue a transport failure for the next request to `origin`.
    pub fn fail(&self, origin: &str, kind: TransportErrorKind) {
        self.push(
            origin,
            Scripted::Fail(kind, format!("scripted {kind:?} failure for {origin}")),
        );
    }

    /// Every request sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Replies still queued for `origin`.
    #[must_use]
    pub fn pending(&self, origin: &str) -> usize {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(origin.trim_end_matches('/'))
            .map_or(0, VecDeque::len)
    }

    fn push(&self, origin: &str, reply: Scripted) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(origin.trim_end_matches('/').to_string())
            .or_default()
            .push_back(reply);
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &HttpRequest<'_>) -> TransportResult<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method: request.method,
                url: request.url.to_string(),
                headers: request.headers.clone(),
                body: request.body.to_vec(),
            });

        let origin = origin_of(request.url);
        let next = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(origin)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(kind, message)) => Err(TransportError::new(kind, message)),
            None => Err(TransportError::new(
                TransportErrorKind::Connect,
                format!("connection refused: nothing scripted for {origin}"),
            )),
        }
    }
}

fn origin_of(url: &str) -> &str {
    let after_scheme = url.find("://").map_or(0, |i| i + 3);
    match url[after_scheme..].find('/') {
        Some(i) => &url[..after_scheme + i],
        None => url,
    }
}
