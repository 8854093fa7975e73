//! # streamload
//!
//! A blocking client for the HTTP stream-load protocol used to bulk-ingest
//! CSV or JSON data into an analytical database.
//!
//! ## Key Features
//!
//! - **Coordinator failover** - requests rotate through a pool of front-end
//!   endpoints when one cannot be reached
//! - **Worker redirect** - `307` replies are followed by replaying the
//!   buffered body to the worker node
//! - **Compression** - GZIP, LZ4_FRAME, ZSTD and BZIP2 bodies (each behind a
//!   feature flag)
//! - **Record loaders** - send a slice of serde records as CSV or JSON with the
//!   `columns` mapping derived from the record type
//! - **Transactions** - begin / load / prepare / commit / rollback for loads
//!   that must become visible together
//!
//! ## Quick Start
//!
//! ```no_run
//! use streamload::{Compression, DataFormat, LoadOptions, StreamLoadClient};
//! # fn main() -> streamload::Result<()> {
//!
//! let client = StreamLoadClient::new("fe.internal", 8030, "analytics", "root", "")?;
//!
//! let opts = LoadOptions::default()
//!     .with_format(DataFormat::Csv)
//!     .with_columns("id,name,age")
//!     .with_compression(Compression::Gzip);
//! let resp = client.load("users", &b"1,alice,30\n2,bob,25\n"[..], &opts)?;
//! println!("loaded {} rows in {} ms", resp.number_loaded_rows, resp.load_time_ms);
//! # Ok(())
//! # }
//! ```
//!
//! ## Transactions
//!
//! ```no_run
//! # use streamload::{LoadOptions, StreamLoadClient};
//! # fn main() -> streamload::Result<()> {
//! # let client = StreamLoadClient::new("fe.internal", 8030, "analytics", "root", "")?;
//! let label = "orders-2024-06-01";
//! client.begin_transaction(label, "orders")?;
//! let loaded = client
//!     .load_transaction(label, "orders", &b"1,10.5\n"[..], &LoadOptions::default())
//!     .and_then(|_| client.prepare_transaction(label));
//! match loaded {
//!     Ok(_) => {
//!         client.commit_transaction(label)?;
//!     }
//!     Err(e) => {
//!         client.rollback_transaction(label)?;
//!         return Err(e);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`StreamLoadError`]. When the server answered with
//! a decodable reply, the error carries it:
//!
//! ```no_run
//! # use streamload::{LoadOptions, StreamLoadClient};
//! # fn main() -> streamload::Result<()> {
//! # let client = StreamLoadClient::new("fe.internal", 8030, "analytics", "root", "")?;
//! if let Err(e) = client.load("users", &b"garbage"[..], &LoadOptions::default()) {
//!     if let Some(load) = e.reply().and_then(|r| r.as_load()) {
//!         eprintln!("{} rows filtered, see {}", load.number_filtered_rows, load.error_url);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate logs through the `log` facade: each attempt and redirect at
//! `debug`, each failover at `warn`, transaction milestones at `info` and
//! response bodies at `trace`. Install any logger (e.g. `env_logger`) to see them.

pub mod client;
pub mod columns;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod io;
mod load;
pub mod options;
pub mod response;
mod transaction;
pub mod transport;

pub use client::{ClientBuilder, StreamLoadClient};
pub use columns::{Columns, FieldTag, Tag, TagKind};
pub use endpoint::{Endpoint, EndpointPool};
pub use error::{Operation, Result, StreamLoadError};
pub use io::compression::Compression;
pub use options::{DataFormat, LoadOptions};
pub use response::{
    LoadResponse, STREAM_LOAD_SUCCESS, ServerReply, TRANSACTION_OK, TransactionBeginResponse,
    TransactionCommitResponse, TransactionPrepareResponse, TransactionRollbackResponse,
};
