//! The client value and its configuration.
//!
//! A [`StreamLoadClient`] owns the endpoint pool, the target database, the
//! credentials and the transport. It holds no per-call state, so one client
//! can be shared behind an `Arc` by any number of threads.
//!
//! ## Configuration sources
//! - [`StreamLoadClient::new`] for a single coordinator
//! - [`ClientBuilder`] for several coordinators, default headers, a custom
//!   transport or timeout
//! - [`ClientBuilder::from_env`] for `STREAMLOAD_*` environment variables
//!
//! ```no_run
//! use streamload::StreamLoadClient;
//! use std::time::Duration;
//! # fn main() -> streamload::Result<()> {
//!
//! let client = StreamLoadClient::builder()
//!     .endpoint("fe1.internal", 8030)
//!     .endpoint("fe2.internal", 8030)
//!     .database("analytics")
//!     .credentials("loader", "secret")
//!     .default_header("max_filter_ratio", "0.1")
//!     .timeout(Duration::from_secs(600))
//!     .build()?;
//! # let _ = client;
//! # Ok(())
//! # }
//! ```

use crate::dispatch::{Dispatcher, RequestTemplate};
use crate::endpoint::{Endpoint, EndpointPool};
use crate::error::{Operation, Result, StreamLoadError};
use crate::response::Reply;
use crate::transport::{DEFAULT_TIMEOUT, Headers, Transport, UreqTransport};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, trace};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_ENDPOINTS: &str = "STREAMLOAD_ENDPOINTS";
pub const ENV_DATABASE: &str = "STREAMLOAD_DATABASE";
pub const ENV_USER: &str = "STREAMLOAD_USER";
pub const ENV_PASSWORD: &str = "STREAMLOAD_PASSWORD";

/// Client for the stream-load protocol of one database.
///
/// # Thread Safety
/// `Send + Sync`. Concurrent calls share the endpoint pool, so a failover
/// observed by one call moves the cursor for all of them.
pub struct StreamLoadClient {
    pool: EndpointPool,
    database: String,
    authorization: String,
    default_headers: Headers,
    transport: Arc<dyn Transport>,
}

impl StreamLoadClient {
    /// A client for a single coordinator using the default HTTP transport.
    ///
    /// # Errors
    /// Returns [`StreamLoadError::MissingConfig`] if `database` or `user` is empty.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Self::builder()
            .endpoint(host, port)
            .database(database)
            .credentials(user, password)
            .build()
    }

    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The endpoint the next call will try first.
    #[must_use]
    pub fn current_endpoint(&self) -> &Endpoint {
        self.pool.current()
    }

    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        self.pool.endpoints()
    }

    /// Headers every request starts from: defaults, then auth and `Expect`.
    pub(crate) fn base_headers(&self) -> Headers {
        let mut headers = self.default_headers.clone();
        headers.set("Authorization", self.authorization.as_str());
        headers.set("Expect", "100-continue");
        headers
    }

    /// Dispatch `template`, decode the reply and classify it.
    ///
    /// Decoding comes first: a body that is not a valid reply is a
    /// [`StreamLoadError::Decode`] whatever the HTTP status. A non-200 status
    /// is [`StreamLoadError::HttpStatus`]. When `expected` is set, a reply
    /// whose status field differs is [`StreamLoadError::Status`].
    pub(crate) fn execute<T: Reply>(
        &self,
        operation: Operation,
        template: &RequestTemplate,
        expected: Option<&'static str>,
    ) -> Result<T> {
        let response = Dispatcher::new(&self.pool, self.transport.as_ref())
            .dispatch(operation, template)?;
        let status = response.status;
        trace!(
            "{operation}: HTTP {status} body: {}",
            String::from_utf8_lossy(&response.body)
        );

        let reply: T = serde_json::from_slice(&response.body).map_err(|source| {
            StreamLoadError::Decode {
                operation,
                status,
                source,
            }
        })?;

        if status != 200 {
            return Err(StreamLoadError::HttpStatus {
                operation,
                status,
                reply: Box::new(reply.into()),
            });
        }
        if let Some(expected) = expected
            && reply.status_field() != expected
        {
            debug!(
                "{operation}: server status '{}', expected '{expected}'",
                reply.status_field()
            );
            return Err(StreamLoadError::Status {
                operation,
                expected,
                reply: Box::new(reply.into()),
            });
        }
        Ok(reply)
    }
}

impl fmt::Debug for StreamLoadClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamLoadClient")
            .field("endpoints", &self.pool.endpoints())
            .field("current", self.pool.current())
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Step-by-step client configuration.
#[derive(Clone)]
pub struct ClientBuilder {
    endpoints: Vec<Endpoint>,
    database: Option<String>,
    user: Option<String>,
    password: String,
    default_headers: Headers,
    transport: Option<Arc<dyn Transport>>,
    timeout: Duration,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            database: None,
            user: None,
            password: String::new(),
            default_headers: Headers::new(),
            transport: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`StreamLoadError::InvalidEndpoint`] if `STREAMLOAD_ENDPOINTS` is malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Configuration from `(name, value)` pairs.
    ///
    /// Reads `STREAMLOAD_ENDPOINTS` (comma-separated `host:port`),
    /// `STREAMLOAD_DATABASE`, `STREAMLOAD_USER` and `STREAMLOAD_PASSWORD`;
    /// other names are ignored. Absent variables leave the builder unset, so
    /// [`build`](Self::build) reports what is missing.
    ///
    /// # Errors
    /// Returns [`StreamLoadError::InvalidEndpoint`] for a malformed endpoint entry.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut builder = Self::new();
        let mut user: Option<String> = None;
        let mut password = String::new();
        for (key, value) in vars {
            match key.as_ref() {
                ENV_ENDPOINTS => {
                    let value: String = value.into();
                    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                        builder.endpoints.push(entry.parse()?);
                    }
                }
                ENV_DATABASE => builder.database = Some(value.into()),
                ENV_USER => user = Some(value.into()),
                ENV_PASSWORD => password = value.into(),
                _ => {}
            }
        }
        if let Some(user) = user {
            builder = builder.credentials(user, password);
        }
        Ok(builder)
    }

    #[must_use]
    pub fn endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.endpoints.push(Endpoint::new(host, port));
        self
    }

    #[must_use]
    pub fn endpoints(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = password.into();
        self
    }

    /// A header sent on every request. Protocol headers of the same name win.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.set(name, value);
        self
    }

    /// Send through `transport` instead of the default HTTP agent.
    ///
    /// The [`timeout`](Self::timeout) setting only configures the default agent.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Overall deadline of one HTTP exchange (default: 30 minutes).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// - [`StreamLoadError::NoEndpoints`] if no endpoint was configured
    /// - [`StreamLoadError::MissingConfig`] if the database or user is missing or empty
    pub fn build(self) -> Result<StreamLoadClient> {
        let pool = EndpointPool::new(self.endpoints)?;
        let database = self
            .database
            .filter(|d| !d.is_empty())
            .ok_or(StreamLoadError::MissingConfig("database"))?;
        let user = self
            .user
            .filter(|u| !u.is_empty())
            .ok_or(StreamLoadError::MissingConfig("user"))?;
        let authorization = format!("Basic {}", STANDARD.encode(format!("{user}:{}", self.password)));
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(UreqTransport::new(self.timeout)),
        };

        debug!(
            "stream load client for database '{database}' over {} endpoint(s)",
            pool.len()
        );
        Ok(StreamLoadClient {
            pool,
            database,
            authorization,
            default_headers: self.default_headers,
            transport,
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("endpoints", &self.endpoints)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("default_headers", &self.default_headers)
            .field("custom_transport", &self.transport.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
