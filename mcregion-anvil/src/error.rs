//! Failure kinds surfaced while resolving a chunk.
//!
//! An ungenerated chunk is not represented here; readers return `Ok(None)`
//! for it so callers can never mistake it for a corrupt file.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegionError {
    /// A caller passed an argument outside the accepted domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The region file does not exist or could not be opened.
    #[error("region file {path:?} not found: {source}")]
    RegionFileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the region file failed part way, or returned fewer bytes than its length.
    #[error("failed to read region file {path:?}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The buffer for a region file could not be allocated.
    #[error("could not allocate {bytes} bytes for region file {path:?}")]
    OutOfMemory { path: PathBuf, bytes: u64 },

    #[error("malformed region file {name}: {reason}")]
    MalformedRegionFile { name: String, reason: String },

    /// The chunk uses a compression scheme this reader does not handle.
    #[error("unsupported compression type: {0}")]
    UnsupportedCompression(u8),

    #[error("chunk decompression failed: {0}")]
    DecompressionFailure(String),
}

impl RegionError {
    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        RegionError::MalformedRegionFile {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable short label, used for log lines and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RegionError::InvalidArgument(_) => "invalid-argument",
            RegionError::RegionFileNotFound { .. } => "region-file-not-found",
            RegionError::IoFailure { .. } => "io-failure",
            RegionError::OutOfMemory { .. } => "out-of-memory",
            RegionError::MalformedRegionFile { .. } => "malformed-region-file",
            RegionError::UnsupportedCompression(_) => "unsupported-compression",
            RegionError::DecompressionFailure(_) => "decompression-failure",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegionError>;
