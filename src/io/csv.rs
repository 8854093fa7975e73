//! CSV record encoding for stream-load bodies.
//!
//! Rows are serialized with Serde in field order and without a header row;
//! the server maps them onto table columns through the `columns` header.

use anyhow::{Context, Result, bail};
use csv::WriterBuilder;
use serde::Serialize;

/// Serialize `records` as CSV rows separated by `\n`.
///
/// # Errors
/// Returns an error if any record fails to serialize (e.g. nested structs,
/// which CSV cannot express).
pub fn encode_csv_records<T: Serialize>(records: &[T], delimiter: u8) -> Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_writer(Vec::new());
    for (i, rec) in records.iter().enumerate() {
        wtr.serialize(rec)
            .with_context(|| format!("serialize CSV record #{}", i + 1))?;
    }
    wtr.into_inner().context("flush CSV writer")
}

/// The single-byte delimiter for a `column_separator` value.
///
/// # Errors
/// Returns an error for an empty or multi-byte separator, which the CSV
/// writer cannot produce.
pub fn delimiter_byte(separator: &str) -> Result<u8> {
    match separator.as_bytes() {
        [b] => Ok(*b),
        _ => bail!("column separator {separator:?} must be a single byte to encode records"),
    }
}
