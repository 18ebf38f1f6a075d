//! Key validation.

use crate::error::{ErrorKind, Result};

/// Longest key accepted by any backend, in bytes.
pub const MAX_KEY_LENGTH: usize = 255;

/// Validates a store key.
///
/// Keys must be non-empty, at most [`MAX_KEY_LENGTH`] bytes and free of
/// control characters. Null bytes in particular would be truncated by the
/// SQLite C API.
///
/// # Examples
///
/// ```
/// use firstrun_store::validate_key;
/// assert!(validate_key("is_first_run").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("a\0b").is_err());
/// ```
pub fn validate(key: &str) -> Result<&str> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH || key.chars().any(char::is_control) {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(key)
}
