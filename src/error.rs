// src/error.rs

//! Error types for index generation

use thiserror::Error;

/// Errors raised while building a repository index
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem read/write failure
    #[error("I/O error: {0}")]
    IoError(String),

    /// Statistics endpoint could not be reached or answered with an error
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Malformed XML, JSON or version data
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Add-on archive is corrupt or unreadable
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// Required entry is missing (e.g. the manifest inside an archive)
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Manifest has neither form of the metadata extension point
    #[error("No metadata extension point in manifest of {0}")]
    MissingMetadata(String),

    /// Invalid setting passed by the caller
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for index operations
pub type Result<T> = std::result::Result<T, Error>;
