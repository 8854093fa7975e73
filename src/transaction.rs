//! Transactional loading: several loads made visible atomically.
//!
//! The server tracks the transaction under a caller-chosen label:
//!
//! ```text
//! begin -> load* -> prepare -> commit
//!   \                  \
//!    +--> rollback      +--> rollback
//! ```
//!
//! The client keeps no per-label state. Calls made out of order are rejected
//! by the server and surface as errors carrying its reply.
//!
//! Begin, commit and rollback accept any reply with HTTP 200: the server has
//! been seen to answer them with a status other than `OK` even when they took
//! effect. Use `is_success()` on the reply for the strict check. Transaction
//! load and prepare require `OK`.

use crate::client::StreamLoadClient;
use crate::dispatch::RequestTemplate;
use crate::error::{Operation, Result};
use crate::load::{encode_body, transaction_load_headers};
use crate::options::LoadOptions;
use crate::response::{
    LoadResponse, TRANSACTION_OK, TransactionBeginResponse, TransactionCommitResponse,
    TransactionPrepareResponse, TransactionRollbackResponse,
};
use crate::transport::{Headers, Method};
use log::{debug, info};
use std::io::Read;

const BEGIN_PATH: &str = "/api/transaction/begin";
const LOAD_PATH: &str = "/api/transaction/load";
const PREPARE_PATH: &str = "/api/transaction/prepare";
const COMMIT_PATH: &str = "/api/transaction/commit";
const ROLLBACK_PATH: &str = "/api/transaction/rollback";

impl StreamLoadClient {
    /// Open a transaction on `table` under `label`.
    ///
    /// # Errors
    /// Transport and protocol errors, or [`StreamLoadError::HttpStatus`](crate::StreamLoadError::HttpStatus)
    /// for a non-200 reply.
    pub fn begin_transaction(&self, label: &str, table: &str) -> Result<TransactionBeginResponse> {
        let mut headers = self.control_headers(label);
        headers.set("table", table);
        let reply: TransactionBeginResponse =
            self.control(Operation::BeginTransaction, BEGIN_PATH, headers, None)?;
        info!("transaction '{label}' begun on {}.{table} (txn {})", self.database(), reply.txn_id);
        Ok(reply)
    }

    /// Send `data` as part of transaction `label`.
    ///
    /// `label` overrides any label in `options`.
    ///
    /// # Errors
    /// The errors of [`load`](Self::load), with `OK` as the expected status.
    pub fn load_transaction<R: Read>(
        &self,
        label: &str,
        table: &str,
        data: R,
        options: &LoadOptions,
    ) -> Result<LoadResponse> {
        let operation = Operation::LoadTransaction;
        let body = encode_body(operation, data, options.compression)?;
        let headers =
            transaction_load_headers(self.base_headers(), options, label, self.database(), table);
        debug!("{operation}: {} body bytes for '{label}'", body.len());

        let template = RequestTemplate::new(Method::Put, LOAD_PATH, headers).with_body(body);
        self.execute(operation, &template, Some(TRANSACTION_OK))
    }

    /// Pre-commit transaction `label`.
    ///
    /// # Errors
    /// Transport and protocol errors, a non-200 reply, or a status other than `OK`.
    pub fn prepare_transaction(&self, label: &str) -> Result<TransactionPrepareResponse> {
        let headers = self.control_headers(label);
        self.control(
            Operation::PrepareTransaction,
            PREPARE_PATH,
            headers,
            Some(TRANSACTION_OK),
        )
    }

    /// Make transaction `label` visible.
    ///
    /// # Errors
    /// Transport and protocol errors, or a non-200 reply.
    pub fn commit_transaction(&self, label: &str) -> Result<TransactionCommitResponse> {
        let headers = self.control_headers(label);
        let reply: TransactionCommitResponse =
            self.control(Operation::CommitTransaction, COMMIT_PATH, headers, None)?;
        info!("transaction '{label}' committed: {}", reply.status);
        Ok(reply)
    }

    /// Abort transaction `label`.
    ///
    /// # Errors
    /// Transport and protocol errors, or a non-200 reply.
    pub fn rollback_transaction(&self, label: &str) -> Result<TransactionRollbackResponse> {
        let headers = self.control_headers(label);
        let reply: TransactionRollbackResponse =
            self.control(Operation::RollbackTransaction, ROLLBACK_PATH, headers, None)?;
        info!("transaction '{label}' rolled back: {}", reply.status);
        Ok(reply)
    }

    fn control_headers(&self, label: &str) -> Headers {
        let mut headers = self.base_headers();
        headers.set("label", label);
        headers.set("db", self.database());
        headers.set("Content-Type", "application/json");
        headers
    }

    fn control<T: crate::response::Reply>(
        &self,
        operation: Operation,
        path: &str,
        headers: Headers,
        expected: Option<&'static str>,
    ) -> Result<T> {
        let template = RequestTemplate::new(Method::Post, path, headers);
        self.execute(operation, &template, expected)
    }
}
