//! File reader with automatic decompression support.
//!
//! Alert logs are often rotated and archived compressed. Everything that
//! reads a log goes through [`open_file`], so `.gz` and `.zst` archives can
//! be reported on without manual extraction.
//!
//! # Supported Formats
//!
//! - Plain text files
//! - Gzip compressed files (.gz)
//! - Zstandard compressed files (.zst)

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Opens a file with automatic decompression based on extension.
///
/// - `.gz` → Gzip decompression
/// - `.zst` → Zstandard decompression
/// - Otherwise → Plain file
pub fn open_file(path: impl AsRef<Path>) -> Result<Box<dyn Read + Send>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension {
        "gz" => Ok(Box::new(GzDecoder::new(file))),
        "zst" => {
            let decoder = zstd::Decoder::new(file).with_context(|| {
                format!("Failed to create zstd decoder for: {}", path.display())
            })?;
            Ok(Box::new(decoder))
        }
        _ => Ok(Box::new(file)),
    }
}

/// Reads a whole text log into memory, one entry per line.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, and
/// trailing `\r` from CRLF files is dropped.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut bytes = Vec::new();
    open_file(path)?
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect())
}
