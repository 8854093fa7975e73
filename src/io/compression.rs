//! Payload compression for stream loads.
//!
//! The server accepts four compressed body encodings, announced through the
//! `compression` header. Each one is a [`CompressionCodec`] that turns a byte
//! stream into a compressed buffer, gated behind its own feature flag:
//!
//! - **GZIP** - via `flate2` (feature: `compression-gzip`)
//! - **LZ4_FRAME** - via `lz4_flex` (feature: `compression-lz4`)
//! - **ZSTD** - via `zstd` (feature: `compression-zstd`)
//! - **BZIP2** - via `bzip2` (feature: `compression-bzip2`)
//!
//! ## Usage
//! ```
//! use streamload::io::compression::{compress, Compression};
//! # #[cfg(not(feature = "compression-zstd"))]
//! # fn main() {}
//! # #[cfg(feature = "compression-zstd")]
//! # fn main() -> anyhow::Result<()> {
//!
//! let raw = b"1,alice,25\n2,bob,30\n".repeat(100);
//! let packed = compress(&raw[..], Compression::Zstd)?;
//! assert!(packed.len() < raw.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Decisions
//!
//! ### Buffer, don't stream
//! The result is a `Vec<u8>` rather than a wrapping reader: the dispatcher may
//! send the body more than once (failover, worker redirect), so the compressed
//! form has to exist in memory before the first attempt anyway.

use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

/// Body compression announced in the `compression` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Lz4Frame,
    Zstd,
    Bzip2,
}

impl Compression {
    /// The header value, or `None` when the body is sent raw.
    #[must_use]
    pub const fn header_value(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some("GZIP"),
            Self::Lz4Frame => Some("LZ4_FRAME"),
            Self::Zstd => Some("ZSTD"),
            Self::Bzip2 => Some("BZIP2"),
        }
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_value().unwrap_or("NONE"))
    }
}

impl FromStr for Compression {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "" | "NONE" => Ok(Self::None),
            "GZIP" | "GZ" => Ok(Self::Gzip),
            "LZ4_FRAME" | "LZ4" => Ok(Self::Lz4Frame),
            "ZSTD" => Ok(Self::Zstd),
            "BZIP2" | "BZ2" => Ok(Self::Bzip2),
            other => Err(anyhow!("unknown compression '{other}'")),
        }
    }
}

/// One compression algorithm.
///
/// # Thread Safety
/// Codecs are stateless statics shared by every thread.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip", "zstd").
    fn name(&self) -> &str;

    /// The protocol value this codec produces.
    fn compression(&self) -> Compression;

    /// Compress everything `input` yields into a finished buffer.
    fn compress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>>;

    /// Inverse of [`compress`](Self::compress).
    fn decompress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>>;
}

/// Look up the built-in codec for `compression`.
///
/// Returns `None` for [`Compression::None`] and for codecs whose feature is off.
#[must_use]
pub fn codec_for(compression: Compression) -> Option<&'static dyn CompressionCodec> {
    match compression {
        Compression::None => None,
        #[cfg(feature = "compression-gzip")]
        Compression::Gzip => Some(&GzipCodec),
        #[cfg(feature = "compression-lz4")]
        Compression::Lz4Frame => Some(&Lz4FrameCodec),
        #[cfg(feature = "compression-zstd")]
        Compression::Zstd => Some(&ZstdCodec),
        #[cfg(feature = "compression-bzip2")]
        Compression::Bzip2 => Some(&Bzip2Codec),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// Read `input` to the end and return it, compressed with `compression`.
///
/// [`Compression::None`] returns the bytes unchanged.
///
/// # Errors
/// Returns an error if reading fails, the codec fails, or the codec's feature is disabled.
pub fn compress<R: Read>(mut input: R, compression: Compression) -> Result<Vec<u8>> {
    if compression.is_none() {
        let mut buf = Vec::new();
        input.read_to_end(&mut buf).context("buffer payload")?;
        return Ok(buf);
    }
    let codec = codec_for(compression)
        .ok_or_else(|| anyhow!("compression {compression} is not enabled in this build"))?;
    codec
        .compress(&mut input)
        .with_context(|| format!("compress payload with {} codec", codec.name()))
}

/// Decompress a buffer produced by [`compress`].
///
/// # Errors
/// Returns an error if the codec fails or its feature is disabled.
pub fn decompress(input: &[u8], compression: Compression) -> Result<Vec<u8>> {
    if compression.is_none() {
        return Ok(input.to_vec());
    }
    let codec = codec_for(compression)
        .ok_or_else(|| anyhow!("compression {compression} is not enabled in this build"))?;
    codec
        .decompress(&mut &input[..])
        .with_context(|| format!("decompress payload with {} codec", codec.name()))
}

// ============================================================================
// Built-in Codec Implementations
// ============================================================================

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn compression(&self) -> Compression {
        Compression::Gzip
    }

    fn compress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>> {
        use flate2::Compression as Level;
        use flate2::write::GzEncoder;
        let mut encoder = GzEncoder::new(Vec::new(), Level::default());
        io::copy(input, &mut encoder)?;
        encoder.finish()
    }

    fn decompress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>> {
        use flate2::read::GzDecoder;
        let mut out = Vec::new();
        GzDecoder::new(input).read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(feature = "compression-lz4")]
struct Lz4FrameCodec;

#[cfg(feature = "compression-lz4")]
impl CompressionCodec for Lz4FrameCodec {
    fn name(&self) -> &str {
        "lz4-frame"
    }

    fn compression(&self) -> Compression {
        Compression::Lz4Frame
    }

    fn compress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>> {
        use lz4_flex::frame::FrameEncoder;
        let mut encoder = FrameEncoder::new(Vec::new());
        io::copy(input, &mut encoder)?;
        encoder.finish().map_err(io::Error::other)
    }

    fn decompress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>> {
        use lz4_flex::frame::FrameDecoder;
        let mut out = Vec::new();
        FrameDecoder::new(input).read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn compression(&self) -> Compression {
        Compression::Zstd
    }

    fn compress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>> {
        zstd::stream::encode_all(input, 3)
    }

    fn decompress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>> {
        zstd::stream::decode_all(input)
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2Codec;

#[cfg(feature = "compression-bzip2")]
impl CompressionCodec for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn compression(&self) -> Compression {
        Compression::Bzip2
    }

    fn compress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>> {
        use bzip2::Compression as Level;
        use bzip2::write::BzEncoder;
        let mut encoder = BzEncoder::new(Vec::new(), Level::default());
        io::copy(input, &mut encoder)?;
        encoder.finish()
    }

    fn decompress(&self, input: &mut dyn Read) -> io::Result<Vec<u8>> {
        use bzip2::read::BzDecoder;
        let mut out = Vec::new();
        BzDecoder::new(input).read_to_end(&mut out)?;
        Ok(out)
    }
}
