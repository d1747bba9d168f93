//! Error handling for rotator-store
//!
//! Wraps rotator-core ExError with store-specific helpers

use rotator_core::errors::{ExError, ExErrorKind};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an error for an archive file that exists but cannot be decoded
pub fn corrupt_archive(path: &Path, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("archive_load")
        .with_message(format!("Archive {} is not readable: {}", path.display(), err))
}

/// Create a serialization error
pub fn serialization_error(operation: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
