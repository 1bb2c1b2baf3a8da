//! Transparent decompression of tabular sources.
//!
//! Codecs are detected from the file extension first and, failing that, from
//! the magic bytes at the start of the stream. Uncompressed input passes
//! through unchanged.
//!
//! Built-in codecs (each behind its feature flag):
//! - **Gzip** (`.gz`, `.gzip`): `compression-gzip`
//! - **Zstd** (`.zst`, `.zstd`): `compression-zstd`

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A decompression algorithm that can wrap a byte stream.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g. "gzip").
    fn name(&self) -> &'static str;

    /// Lowercase extensions including the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Signature at the start of a compressed stream, if the format has one.
    fn magic_bytes(&self) -> Option<&'static [u8]>;

    /// Wrap `reader` so that reading from the result yields decompressed bytes.
    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;
}

static BUILTIN: &[&dyn CompressionCodec] = &[
    #[cfg(feature = "compression-gzip")]
    &GzipCodec,
    #[cfg(feature = "compression-zstd")]
    &ZstdCodec,
];

/// Codecs compiled into this build.
#[must_use]
pub fn builtin_codecs() -> &'static [&'static dyn CompressionCodec] {
    BUILTIN
}

fn detect_from_extension(path: &Path) -> Option<&'static dyn CompressionCodec> {
    let name = path.to_string_lossy().to_lowercase();
    builtin_codecs()
        .iter()
        .copied()
        .find(|codec| codec.extensions().iter().any(|ext| name.ends_with(ext)))
}

/// Peek at the buffered stream without consuming it.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<&'static dyn CompressionCodec> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    builtin_codecs()
        .iter()
        .copied()
        .find(|codec| codec.magic_bytes().is_some_and(|magic| buf.starts_with(magic)))
}

/// Wrap `reader` with the codec matching `path_hint` (extension first, then
/// magic bytes). Returns the buffered reader as-is when nothing matches.
///
/// # Errors
/// Returns an error if the matching codec fails to initialize on the stream.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        return codec
            .wrap_reader(Box::new(reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    let mut buffered = BufReader::new(reader);
    if let Some(codec) = detect_from_magic(&mut buffered) {
        return codec
            .wrap_reader(Box::new(buffered))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    Ok(Box::new(buffered))
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&'static [u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        // Multi-member aware: concatenated gzip files decode fully.
        Ok(Box::new(flate2::read::MultiGzDecoder::new(reader)))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> Option<&'static [u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }
}
