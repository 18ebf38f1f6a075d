//! Tracker Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Store errors are kept as children of
//! the tracker error that wraps them.

use derive_more::{Display, Error};

/// A tracker error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a tracker failure.
///
/// ### Surfaced to callers
/// - [`ErrorKind::StorageWrite`]
/// - [`ErrorKind::Open`]
/// - [`ErrorKind::Config`]
///
/// ### Recovered internally
/// - [`ErrorKind::StorageRead`] - resolved to the key's default value.
/// - [`ErrorKind::BuildNumberParse`] - resolved to build `0`.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A stored flag could not be read or decoded.
    #[display("failed to read {_0:?} from storage")]
    StorageRead(#[error(not(source))] String),
    /// A flag update could not be persisted to the primary store.
    #[display("failed to write {_0:?} to storage")]
    StorageWrite(#[error(not(source))] String),
    /// The package build string has no usable build number.
    #[display("unparseable build number: {_0:?}")]
    BuildNumberParse(#[error(not(source))] String),
    /// A configured store could not be opened.
    #[display("failed to open store")]
    Open,
    /// Configuration could not be loaded.
    #[display("configuration error")]
    Config,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageWrite(_) | Self::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::StorageWrite("is_first_call".to_string()), true)]
    #[case(ErrorKind::Open, true)]
    #[case(ErrorKind::StorageRead("version".to_string()), false)]
    #[case(ErrorKind::BuildNumberParse("1.0.0".to_string()), false)]
    #[case(ErrorKind::Config, false)]
    fn test_is_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
