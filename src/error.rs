//! Error types for compressed-database access

use thiserror::Error;

use crate::source::HttpError;

/// Result type for VFS operations
pub type Result<T> = std::result::Result<T, ZstdVfsError>;

/// Errors raised while opening or reading a compressed database
#[derive(Error, Debug)]
pub enum ZstdVfsError {
    /// The name looked like a URL but could not be parsed as one
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A range request or size query against the remote resource failed
    #[error("range request failed: {0}")]
    Http(#[from] HttpError),

    /// I/O error on a local file or stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The seekable Zstandard codec rejected the stream
    #[error("seekable zstd decoder error: {0}")]
    Decoder(String),

    /// A mutating operation was attempted against read-only content
    #[error("unsupported operation on read-only database: {0}")]
    ReadOnly(&'static str),

    /// An argument violated the contract of a stream or cursor operation
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// SQLite refused the VFS registration with the given result code
    #[error("VFS registration failed with code {0}")]
    Registration(i32),
}

/// Host-neutral classification of an error.
///
/// The core modules only ever produce these kinds; translating a kind into a
/// host-specific sentinel (a SQLite result code) happens at the adapter
/// boundary in [`crate::vfs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The resource could not be opened or the pipeline could not be built
    CannotOpen,
    /// The operation is not supported on immutable content
    Unsupported,
    /// A caller violated an argument contract
    InvalidArgument,
    /// Process-wide registration failed
    Registration,
}

impl ZstdVfsError {
    /// Classify this error independent of any host error vocabulary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ZstdVfsError::InvalidUrl { .. }
            | ZstdVfsError::Http(_)
            | ZstdVfsError::Io(_)
            | ZstdVfsError::Decoder(_) => ErrorKind::CannotOpen,
            ZstdVfsError::ReadOnly(_) => ErrorKind::Unsupported,
            ZstdVfsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ZstdVfsError::Registration(_) => ErrorKind::Registration,
        }
    }
}
