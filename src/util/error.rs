//! Error types for scene export.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for export operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No destination was configured for the archive
    #[error("Missing archive destination")]
    MissingDestination,

    /// A required input (scene, window, dataset) was absent
    #[error("Missing input: {0}")]
    NullInput(String),

    /// Insert before `open`
    #[error("Archive is not open: {0}")]
    ArchiveNotOpen(String),

    /// Insert or close after `close`
    #[error("Archive is closed: {0}")]
    ArchiveClosed(String),

    /// Buffered sink outgrew its capacity; the sink is unusable afterwards
    #[error("Archive capacity exceeded: {requested} bytes requested, capacity {capacity}")]
    CapacityExceeded { capacity: usize, requested: usize },

    /// Allocation of a buffer failed
    #[error("Allocation of {0} bytes failed")]
    Allocation(usize),

    /// Malformed or unsupported zip container
    #[error("Zip error: {0}")]
    Zip(String),

    /// Dataset has neither point nor image geometry
    #[error("Invalid dataset: {0}")]
    InvalidDataSet(String),

    /// Attribute array does not match its dataset
    #[error("Invalid array '{name}': {reason}")]
    InvalidArray { name: String, reason: String },

    /// Directory could not be created
    #[error("Cannot create directory: {0}")]
    CreateDir(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid dataset error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidDataSet(msg.into())
    }

    /// True for errors after which the sink refuses every further insert.
    pub fn is_fatal_for_sink(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. } | Self::ArchiveClosed(_))
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::CapacityExceeded { capacity: 16, requested: 40 };
        assert!(e.to_string().contains("16"));
        assert!(e.to_string().contains("40"));

        let e = Error::InvalidArray { name: "temp".into(), reason: "short".into() };
        assert!(e.to_string().contains("temp"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_fatal_for_sink() {
        assert!(Error::CapacityExceeded { capacity: 1, requested: 2 }.is_fatal_for_sink());
        assert!(!Error::Allocation(10).is_fatal_for_sink());
    }
}
