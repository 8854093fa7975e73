//! HTTP transports.
//!
//! - [`Transport`] - the trait the dispatcher sends through
//! - [`UreqTransport`] - the production implementation (blocking, no auto-redirect)
//! - [`FakeTransport`] - scripted, in-memory implementation for tests
//!
//! ## Testing with the fake
//! ```
//! use streamload::transport::{FakeTransport, TransportErrorKind};
//! use streamload::StreamLoadClient;
//! use std::sync::Arc;
//! # fn main() -> streamload::Result<()> {
//!
//! let fake = Arc::new(FakeTransport::new());
//! fake.fail("http://fe1:8030", TransportErrorKind::Connect);
//! fake.respond_json(
//!     "http://fe2:8030",
//!     200,
//!     &serde_json::json!({"Status": "Success", "NumberLoadedRows": 1}),
//! );
//!
//! let client = StreamLoadClient::builder()
//!     .endpoint("fe1", 8030)
//!     .endpoint("fe2", 8030)
//!     .database("demo")
//!     .credentials("root", "")
//!     .transport(fake.clone())
//!     .build()?;
//!
//! let resp = client.load("users", &b"1,alice\n"[..], &Default::default())?;
//! assert_eq!(resp.number_loaded_rows, 1);
//! assert_eq!(fake.request_count(), 2);
//! # Ok(())
//! # }
//! ```

pub mod fake;
pub mod http;
pub mod traits;

pub use fake::{FakeTransport, RecordedRequest};
pub use http::{DEFAULT_TIMEOUT, UreqTransport};
pub use traits::{
    Headers, HttpRequest, HttpResponse, Method, Transport, TransportError, TransportErrorKind,
    TransportResult,
};
