//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Configuration sources could not be read or merged.
    #[display("failed to load configuration")]
    Load,
    /// Configuration loaded but describes something unusable.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// No default data directory could be determined for this user.
    #[display("could not determine a home directory")]
    NoHomeDirectory,
}
