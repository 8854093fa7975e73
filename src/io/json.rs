//! JSON record encoding for stream-load bodies.
//!
//! Records are written as one JSON array; loads that use it set
//! `strip_outer_array` so the server treats each element as a row.

use anyhow::{Context, Result};
use serde::Serialize;

/// Serialize `records` as a JSON array.
///
/// # Errors
/// Returns an error if any record fails to serialize (e.g. a map with
/// non-string keys).
pub fn encode_json_records<T: Serialize>(records: &[T]) -> Result<Vec<u8>> {
    serde_json::to_vec(records).context("serialize JSON records")
}
