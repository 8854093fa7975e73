//! Per-call load options and their mapping onto protocol headers.

use crate::io::compression::Compression;
use crate::transport::Headers;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    Csv,
    Json,
}

impl DataFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for one stream load or transaction load.
///
/// Unset options send no header and leave the server default in place.
///
/// ```
/// use streamload::{Compression, DataFormat, LoadOptions};
/// use std::time::Duration;
///
/// let opts = LoadOptions::default()
///     .with_format(DataFormat::Csv)
///     .with_columns("id,name,age")
///     .with_column_separator(",")
///     .with_compression(Compression::Gzip)
///     .with_timeout(Duration::from_secs(600));
/// assert_eq!(opts.headers().get("timeout"), Some("600"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    pub format: Option<DataFormat>,
    pub compression: Compression,
    pub columns: Option<String>,
    pub column_separator: Option<String>,
    pub row_delimiter: Option<String>,
    /// Row filter predicate, sent as the `where` header.
    pub where_predicate: Option<String>,
    pub max_filter_ratio: Option<f64>,
    /// Server-side load timeout, sent in whole seconds rounded up.
    pub timeout: Option<Duration>,
    pub strict_mode: bool,
    pub strip_outer_array: bool,
    pub label: Option<String>,
    pub partitions: Vec<String>,
    pub temporary_partitions: Vec<String>,
    /// Number of rejected rows the server logs; `-1` logs all of them.
    pub log_rejected_record_num: i64,
    pub timezone: Option<String>,
    /// Memory cap for the load in bytes; `0` keeps the server default.
    pub load_mem_limit: u64,
}

impl LoadOptions {
    #[must_use]
    pub const fn with_format(mut self, format: DataFormat) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    #[must_use]
    pub fn with_column_separator(mut self, separator: impl Into<String>) -> Self {
        self.column_separator = Some(separator.into());
        self
    }

    #[must_use]
    pub fn with_row_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.row_delimiter = Some(delimiter.into());
        self
    }

    #[must_use]
    pub fn with_where(mut self, predicate: impl Into<String>) -> Self {
        self.where_predicate = Some(predicate.into());
        self
    }

    #[must_use]
    pub const fn with_max_filter_ratio(mut self, ratio: f64) -> Self {
        self.max_filter_ratio = Some(ratio);
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    #[must_use]
    pub const fn with_strip_outer_array(mut self, strip: bool) -> Self {
        self.strip_outer_array = strip;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_partitions<I, S>(mut self, partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partitions = partitions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_temporary_partitions<I, S>(mut self, partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.temporary_partitions = partitions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_log_rejected_record_num(mut self, n: i64) -> Self {
        self.log_rejected_record_num = n;
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    #[must_use]
    pub const fn with_load_mem_limit(mut self, bytes: u64) -> Self {
        self.load_mem_limit = bytes;
        self
    }

    /// The protocol headers these options map to.
    #[must_use]
    pub fn headers(&self) -> Headers {
        let mut h = Headers::new();
        self.apply(&mut h);
        h
    }

    /// Write the protocol headers into `headers`, replacing same-named entries.
    pub fn apply(&self, headers: &mut Headers) {
        headers.set("strip_outer_array", self.strip_outer_array.to_string());

        if let Some(format) = self.format {
            headers.set("format", format.as_str());
        }
        if let Some(name) = self.compression.header_value() {
            headers.set("compression", name);
        }
        set_opt(headers, "columns", self.columns.as_deref());
        set_opt(headers, "column_separator", self.column_separator.as_deref());
        set_opt(headers, "row_delimiter", self.row_delimiter.as_deref());
        set_opt(headers, "where", self.where_predicate.as_deref());
        if let Some(ratio) = self.max_filter_ratio {
            headers.set("max_filter_ratio", ratio.to_string());
        }
        if let Some(timeout) = self.timeout {
            let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
            headers.set("timeout", secs.to_string());
        }
        if self.strict_mode {
            headers.set("strict_mode", "true");
        }
        set_opt(headers, "label", self.label.as_deref());
        if !self.partitions.is_empty() {
            headers.set("partitions", self.partitions.join(","));
        }
        if !self.temporary_partitions.is_empty() {
            headers.set("temporary_partitions", self.temporary_partitions.join(","));
        }
        if self.log_rejected_record_num != 0 {
            headers.set(
                "log_rejected_record_num",
                self.log_rejected_record_num.to_string(),
            );
        }
        set_opt(headers, "timezone", self.timezone.as_deref());
        if self.load_mem_limit > 0 {
            headers.set("load_mem_limit", self.load_mem_limit.to_string());
        }
    }
}

fn set_opt(headers: &mut Headers, name: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        headers.set(name, v);
    }
}
