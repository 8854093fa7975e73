//! Stream load: one HTTP request that loads one body into one table.
//!
//! The body is read and compressed into memory before the first attempt so
//! that failover and the worker redirect can resend it.

use crate::client::StreamLoadClient;
use crate::columns::{self, Columns, TagKind};
use crate::dispatch::RequestTemplate;
use crate::error::{Operation, Result, StreamLoadError};
use crate::io::compression::{Compression, codec_for, compress};
use crate::io::json::encode_json_records;
use crate::options::{DataFormat, LoadOptions};
use crate::response::{LoadResponse, STREAM_LOAD_SUCCESS};
use crate::transport::{Headers, Method};
use anyhow::anyhow;
use log::debug;
use serde::Serialize;
use std::io::Read;

impl StreamLoadClient {
    /// Load `data` into `table`.
    ///
    /// `data` is compressed with `options.compression` before sending.
    ///
    /// # Errors
    ///
    /// - [`StreamLoadError::Payload`] if reading or compressing `data` fails
    /// - transport and protocol errors from dispatch
    /// - [`StreamLoadError::HttpStatus`] / [`StreamLoadError::Status`] when the
    ///   server rejected the load; the reply is attached
    pub fn load<R: Read>(&self, table: &str, data: R, options: &LoadOptions) -> Result<LoadResponse> {
        let operation = Operation::StreamLoad;
        let body = encode_body(operation, data, options.compression)?;

        let mut headers = self.base_headers();
        options.apply(&mut headers);
        debug!(
            "{operation}: {} body bytes into {}.{table}",
            body.len(),
            self.database()
        );

        let path = format!("/api/{}/{table}/_stream_load", self.database());
        let template = RequestTemplate::new(Method::Put, path, headers).with_body(body);
        self.execute(operation, &template, Some(STREAM_LOAD_SUCCESS))
    }

    /// Load `records` as CSV rows.
    ///
    /// Fills `columns` from the CSV tags of `T` when unset, forces the CSV
    /// format and defaults the column separator to `,`.
    ///
    /// # Errors
    /// Returns [`StreamLoadError::Payload`] for an empty slice, a type without
    /// columns, a multi-byte separator or a record that fails to serialize;
    /// otherwise the errors of [`load`](Self::load).
    #[cfg(feature = "io-csv")]
    pub fn load_csv_records<T: Columns + Serialize>(
        &self,
        table: &str,
        records: &[T],
        options: &LoadOptions,
    ) -> Result<LoadResponse> {
        let operation = Operation::StreamLoad;
        let mut options = options.clone();
        let body = csv_records_body(records, &mut options).map_err(|source| {
            StreamLoadError::Payload { operation, source }
        })?;
        self.load(table, &body[..], &options)
    }

    /// Load `records` as a JSON array.
    ///
    /// Fills `columns` from the JSON tags of `T` when unset, forces the JSON
    /// format and `strip_outer_array`, and compresses with ZSTD unless another
    /// compression was chosen or the ZSTD codec is not built in.
    ///
    /// # Errors
    /// Returns [`StreamLoadError::Payload`] for an empty slice, a type without
    /// columns or a record that fails to serialize; otherwise the errors of
    /// [`load`](Self::load).
    pub fn load_json_records<T: Columns + Serialize>(
        &self,
        table: &str,
        records: &[T],
        options: &LoadOptions,
    ) -> Result<LoadResponse> {
        let operation = Operation::StreamLoad;
        let mut options = options.clone();
        let body = json_records_body(records, &mut options).map_err(|source| {
            StreamLoadError::Payload { operation, source }
        })?;
        self.load(table, &body[..], &options)
    }
}

/// Buffer and compress a load body.
pub(crate) fn encode_body<R: Read>(
    operation: Operation,
    data: R,
    compression: Compression,
) -> Result<Vec<u8>> {
    compress(data, compression).map_err(|source| StreamLoadError::Payload { operation, source })
}

/// Merge the load options, then the transaction identity, into `headers`.
pub(crate) fn transaction_load_headers(
    mut headers: Headers,
    options: &LoadOptions,
    label: &str,
    database: &str,
    table: &str,
) -> Headers {
    options.apply(&mut headers);
    headers.set("label", label);
    headers.set("db", database);
    headers.set("table", table);
    headers
}

#[cfg(feature = "io-csv")]
fn csv_records_body<T: Columns + Serialize>(
    records: &[T],
    options: &mut LoadOptions,
) -> anyhow::Result<Vec<u8>> {
    if records.is_empty() {
        return Err(anyhow!("no records to load"));
    }
    if options.columns.as_deref().is_none_or(str::is_empty) {
        options.columns = Some(columns::column_list::<T>(TagKind::Csv)?);
    }
    options.format = Some(DataFormat::Csv);
    let separator = options
        .column_separator
        .get_or_insert_with(|| ",".to_string());
    let delimiter = crate::io::csv::delimiter_byte(separator)?;
    crate::io::csv::encode_csv_records(records, delimiter)
}

fn json_records_body<T: Columns + Serialize>(
    records: &[T],
    options: &mut LoadOptions,
) -> anyhow::Result<Vec<u8>> {
    if records.is_empty() {
        return Err(anyhow!("no records to load"));
    }
    if options.columns.as_deref().is_none_or(str::is_empty) {
        options.columns = Some(columns::column_list::<T>(TagKind::Json)?);
    }
    options.format = Some(DataFormat::Json);
    options.strip_outer_array = true;
    if options.compression.is_none() && codec_for(Compression::Zstd).is_some() {
        options.compression = Compression::Zstd;
    }
    encode_json_records(records)
}
