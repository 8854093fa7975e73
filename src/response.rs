//! Decoded server replies.
//!
//! Every reply is a flat JSON object with PascalCase keys. Unknown keys are
//! ignored and missing keys fall back to zero values, so an older or newer
//! server never breaks decoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Status sentinel of a successful stream load.
pub const STREAM_LOAD_SUCCESS: &str = "Success";

/// Status sentinel of a successful transaction call.
pub const TRANSACTION_OK: &str = "OK";

/// Reply of a stream load or a transaction load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LoadResponse {
    pub txn_id: i64,
    pub label: String,
    pub status: String,
    pub message: String,
    pub number_total_rows: i64,
    pub number_loaded_rows: i64,
    pub number_filtered_rows: i64,
    pub number_unselected_rows: i64,
    pub load_bytes: i64,
    pub load_time_ms: i64,
    pub begin_txn_time_ms: i64,
    pub stream_load_plan_time_ms: i64,
    pub read_data_time_ms: i64,
    pub write_data_time_ms: i64,
    pub committed_and_publish_time_ms: i64,
    #[serde(rename = "ErrorURL")]
    pub error_url: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TransactionBeginResponse {
    pub txn_id: i64,
    pub label: String,
    pub status: String,
    pub message: String,
}

/// Counters reported once a transaction's data has been flushed.
///
/// Prepare and commit replies share this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TransactionPrepareResponse {
    pub txn_id: i64,
    pub label: String,
    pub status: String,
    pub message: String,
    pub number_total_rows: i64,
    pub number_loaded_rows: i64,
    pub number_filtered_rows: i64,
    pub number_unselected_rows: i64,
    pub load_bytes: i64,
    pub load_time_ms: i64,
    pub stream_load_put_time_ms: i64,
    pub received_data_time_ms: i64,
    pub write_data_time_ms: i64,
    pub commit_and_publish_time_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TransactionCommitResponse {
    pub txn_id: i64,
    pub label: String,
    pub status: String,
    pub message: String,
    pub number_total_rows: i64,
    pub number_loaded_rows: i64,
    pub number_filtered_rows: i64,
    pub number_unselected_rows: i64,
    pub load_bytes: i64,
    pub load_time_ms: i64,
    pub stream_load_put_time_ms: i64,
    pub received_data_time_ms: i64,
    pub write_data_time_ms: i64,
    pub commit_and_publish_time_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TransactionRollbackResponse {
    pub txn_id: i64,
    pub label: String,
    pub status: String,
    pub message: String,
}

impl LoadResponse {
    /// `true` when a plain stream load reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STREAM_LOAD_SUCCESS
    }
}

/// A reply type the client can decode and attach to an error.
pub(crate) trait Reply: DeserializeOwned + Into<ServerReply> {
    fn status_field(&self) -> &str;
}

impl Reply for LoadResponse {
    fn status_field(&self) -> &str {
        &self.status
    }
}

macro_rules! transaction_status {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reply for $ty {
                fn status_field(&self) -> &str {
                    &self.status
                }
            }

            impl $ty {
                /// `true` when the server reported the transaction call as `OK`.
                #[must_use]
                pub fn is_success(&self) -> bool {
                    self.status == TRANSACTION_OK
                }
            }
        )*
    };
}

transaction_status!(
    TransactionBeginResponse,
    TransactionPrepareResponse,
    TransactionCommitResponse,
    TransactionRollbackResponse,
);

/// A decoded reply attached to an application failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerReply {
    Load(LoadResponse),
    Begin(TransactionBeginResponse),
    Prepare(TransactionPrepareResponse),
    Commit(TransactionCommitResponse),
    Rollback(TransactionRollbackResponse),
}

impl ServerReply {
    #[must_use]
    pub fn status(&self) -> &str {
        match self {
            Self::Load(r) => &r.status,
            Self::Begin(r) => &r.status,
            Self::Prepare(r) => &r.status,
            Self::Commit(r) => &r.status,
            Self::Rollback(r) => &r.status,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Load(r) => &r.message,
            Self::Begin(r) => &r.message,
            Self::Prepare(r) => &r.message,
            Self::Commit(r) => &r.message,
            Self::Rollback(r) => &r.message,
        }
    }

    #[must_use]
    pub const fn as_load(&self) -> Option<&LoadResponse> {
        match self {
            Self::Load(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_begin(&self) -> Option<&TransactionBeginResponse> {
        match self {
            Self::Begin(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_prepare(&self) -> Option<&TransactionPrepareResponse> {
        match self {
            Self::Prepare(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_commit(&self) -> Option<&TransactionCommitResponse> {
        match self {
            Self::Commit(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_rollback(&self) -> Option<&TransactionRollbackResponse> {
        match self {
            Self::Rollback(r) => Some(r),
            _ => None,
        }
    }
}

impl From<LoadResponse> for ServerReply {
    fn from(r: LoadResponse) -> Self {
        Self::Load(r)
    }
}

impl From<TransactionBeginResponse> for ServerReply {
    fn from(r: TransactionBeginResponse) -> Self {
        Self::Begin(r)
    }
}

impl From<TransactionPrepareResponse> for ServerReply {
    fn from(r: TransactionPrepareResponse) -> Self {
        Self::Prepare(r)
    }
}

impl From<TransactionCommitResponse> for ServerReply {
    fn from(r: TransactionCommitResponse) -> Self {
        Self::Commit(r)
    }
}

impl From<TransactionRollbackResponse> for ServerReply {
    fn from(r: TransactionRollbackResponse) -> Self {
        Self::Rollback(r)
    }
}
