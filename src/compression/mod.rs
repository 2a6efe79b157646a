// src/compression/mod.rs
//! Gzip encoding for published index files
//!
//! The compressed index must be reproducible: the same input bytes always
//! give the same `.gz` bytes. The gzip header therefore carries a zero
//! modification time and no file name, and the compression level is fixed.

use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Compression level used for published indexes (maximum)
pub const GZIP_LEVEL: u32 = 9;

/// Compression-related errors
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to compress {format} data: {source}")]
    Compression {
        format: &'static str,
        source: io::Error,
    },

    #[error("Failed to decompress {format} data: {source}")]
    Decompression {
        format: &'static str,
        source: io::Error,
    },

    #[error("Data is not {0}")]
    NotCompressed(&'static str),
}

/// Check for the gzip magic bytes `1f 8b`
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Gzip data with a fixed header so output depends only on input
pub fn gzip_deterministic(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), Compression::new(GZIP_LEVEL));

    encoder
        .write_all(data)
        .map_err(|e| CompressionError::Compression {
            format: "gzip",
            source: e,
        })?;

    encoder.finish().map_err(|e| CompressionError::Compression {
        format: "gzip",
        source: e,
    })
}

/// Decompress gzip data to a Vec
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    if !is_gzip(data) {
        return Err(CompressionError::NotCompressed("gzip"));
    }

    let mut output = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut output)
        .map_err(|e| CompressionError::Decompression {
            format: "gzip",
            source: e,
        })?;
    Ok(output)
}
