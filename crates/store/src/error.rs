//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::value::ValueKind;
use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Key is empty, too long, or contains control characters
    #[display("invalid key: {_0:?}")]
    InvalidKey(#[error(not(source))] String),
    /// Store location is not usable (relative path, directory, etc.)
    #[display("invalid store location: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Access denied to the store location
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Whole store file could not be parsed
    #[display("corrupt store file: {}", _0.display())]
    Corrupt(#[error(not(source))] PathBuf),
    /// A single stored value could not be decoded
    #[display("invalid stored value for key {_0:?}")]
    InvalidData(#[error(not(source))] String),
    /// Stored value exists but has a different type than requested
    #[display("type mismatch for key {key:?}: expected {expected}, found {found}")]
    TypeMismatch { key: String, expected: ValueKind, found: ValueKind },
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Database)
    }
}
