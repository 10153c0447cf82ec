//! Error types for descfs

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a description
#[derive(Error, Debug)]
pub enum Error {
    /// Path is absent from every backing store
    #[error("No such entry: {0}")]
    NotFound(String),

    /// The archive tool exited non-zero or could not be spawned
    #[error("Extraction from {archive:?} failed: {reason}")]
    ExtractionFailed { archive: PathBuf, reason: String },

    /// Description base path is missing or unreadable
    #[error("Description store unavailable: {0:?}")]
    StoreUnavailable(PathBuf),

    /// Write-type request against the read-only view
    #[error("Operation not supported on a read-only filesystem: {0}")]
    Unsupported(&'static str),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Description not found: {0}")]
    DescriptionNotFound(String),

    #[error("Invalid description name: {0}")]
    InvalidDescriptionName(String),

    #[error("Invalid mount point: {0:?}")]
    InvalidMountPoint(PathBuf),

    #[error("Mount failed: {0}")]
    Mount(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// errno reported to the filesystem client
    pub fn errno(&self) -> i32 {
        match self {
            Error::NotFound(_) => libc::ENOENT,
            Error::Unsupported(_) => libc::EROFS,
            Error::NotADirectory(_) => libc::ENOTDIR,
            Error::IsADirectory(_) => libc::EISDIR,
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => libc::ENOENT,
            _ => libc::EIO,
        }
    }
}
