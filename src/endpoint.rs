//! Coordinator endpoints and the round-robin selector over them.
//!
//! [`EndpointPool`] is fixed for the client's lifetime. The cursor only moves
//! forward when the dispatcher gives up on the current endpoint, so a failing
//! endpoint is never removed; it simply comes around again later in the
//! rotation.

use crate::error::{Result, StreamLoadError};
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

/// One coordinator node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// `http://host:port`, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = StreamLoadError;

    /// Parse `host:port`. The port is taken after the last colon; IPv6 hosts
    /// must be bracketed (`[::1]:8030`).
    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        let invalid = |reason: &str| StreamLoadError::InvalidEndpoint {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (host, port) = input
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected host:port"))?;
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(invalid("host contains whitespace"));
        }
        if host.starts_with('[') || host.ends_with(']') {
            host.strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .filter(|h| !h.is_empty())
                .ok_or_else(|| invalid("malformed bracketed host"))?;
        } else if host.contains(':') {
            return Err(invalid("IPv6 host must be enclosed in brackets"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| invalid(&format!("bad port: {e}")))?;
        Ok(Self::new(host, port))
    }
}

/// Ordered endpoints plus the cursor of the one currently in use.
///
/// Reads take a shared lock and may run concurrently; [`advance`](Self::advance)
/// takes the exclusive lock. The network call itself never happens under the lock.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    cursor: RwLock<usize>,
}

impl EndpointPool {
    /// Build a pool. Fails with [`StreamLoadError::NoEndpoints`] when empty.
    ///
    /// # Errors
    ///
    /// Returns an error if `endpoints` is empty.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(StreamLoadError::NoEndpoints);
        }
        Ok(Self {
            endpoints,
            cursor: RwLock::new(0),
        })
    }

    /// The endpoint the next request goes to.
    pub fn current(&self) -> &Endpoint {
        let index = *self.cursor.read().unwrap_or_else(PoisonError::into_inner);
        &self.endpoints[index]
    }

    /// Rotate to the next endpoint, wrapping around at the end.
    pub fn advance(&self) {
        let mut cursor = self.cursor.write().unwrap_or_else(PoisonError::into_inner);
        *cursor = (*cursor + 1) % self.endpoints.len();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}
