//! The transport seam between the dispatcher and an HTTP stack.
//!
//! A [`Transport`] sends exactly one request and reports either the response
//! (any status, including redirects) or a [`TransportError`]. It must never
//! follow redirects on its own: the dispatcher replays the buffered body to the
//! worker node itself.

use std::error::Error;
use std::fmt;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Put,
    Post,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header list with case-insensitive replacement.
///
/// Protocol parameters travel as headers, and later writers win: client
/// defaults are applied first and protocol headers overwrite them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Set `name` to `value`, replacing an existing entry with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.set(k, v);
        }
        headers
    }
}

/// A request bound to a concrete URL.
///
/// Headers and body are borrowed from the dispatcher's template, so every
/// attempt and the redirect hop send the very same bytes.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub method: Method,
    pub url: &'a str,
    pub headers: &'a Headers,
    pub body: &'a [u8],
}

// ============================================================================
// Responses
// ============================================================================

/// A fully read response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        self.status == 307
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, host not found, or an I/O error before a response.
    Connect,
    /// No response within the transport timeout.
    Timeout,
    /// The request could not be built (bad URL, bad header value).
    InvalidRequest,
    /// A status line arrived but the body could not be read.
    ResponseBody,
    Other,
}

impl TransportErrorKind {
    /// Whether trying another endpoint can cure this failure.
    ///
    /// A malformed request fails on every endpoint, and a response whose body
    /// broke mid-read means the server already saw the request.
    #[must_use]
    pub const fn allows_failover(self) -> bool {
        matches!(self, Self::Connect | Self::Timeout | Self::Other)
    }
}

#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub const fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

// ============================================================================
// Transport
// ============================================================================

/// Sends one HTTP request.
///
/// # Thread Safety
/// A single transport is shared by every call on a client, from any thread.
pub trait Transport: Send + Sync {
    /// Send `request` and read the whole response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response was received or the
    /// response could not be read. HTTP error statuses are **not** errors.
    fn send(&self, request: &HttpRequest<'_>) -> TransportResult<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &HttpRequest<'_>) -> TransportResult<HttpResponse> {
        (**self).send(request)
    }
}
