//! Ordered read sources for stored flags.
//!
//! Reads try the primary store first, then each legacy store in the order
//! they were added. A value found in a legacy store is written forward into
//! the primary, so the legacy store stops being consulted for that key. Writes
//! only ever target the primary.

use crate::build::BuildNumber;
use crate::error::{ErrorKind, Result};
use crate::keys::RESET_VERSION;
use exn::ResultExt;
use firstrun_store::backend::ReadOnlyStore;
use firstrun_store::error::{ErrorKind as StoreErrorKind, Result as StoreResult};
use firstrun_store::{StoreHandle, Value};
use std::fmt::Debug;
use std::sync::Arc;

#[derive(Clone)]
pub struct Sources {
    primary: StoreHandle,
    legacy: Vec<StoreHandle>,
}

impl Sources {
    pub fn new(primary: StoreHandle) -> Self {
        Self { primary, legacy: Vec::new() }
    }

    /// Add a fallback store, consulted after the primary and any previously
    /// added legacy stores. It is wrapped in a [`ReadOnlyStore`].
    pub fn with_legacy(mut self, legacy: StoreHandle) -> Self {
        self.legacy.push(Arc::new(ReadOnlyStore::new(legacy)));
        self
    }

    pub fn primary(&self) -> &StoreHandle {
        &self.primary
    }

    /// Read a boolean flag.
    pub async fn read_flag(&self, key: &str) -> Result<Option<bool>> {
        self.read(key, |value| value.expect_bool(key)).await
    }

    /// Read a build number, see [`decode_build()`].
    pub async fn read_build(&self, key: &str) -> Result<Option<BuildNumber>> {
        self.read(key, |value| decode_build(key, value)).await
    }

    async fn read<T>(&self, key: &str, decode: impl Fn(&Value) -> StoreResult<T>) -> Result<Option<T>> {
        let read_error = || ErrorKind::StorageRead(key.to_string());
        if let Some(value) = self.primary.get(key).await.or_raise(read_error)? {
            return decode(&value).map(Some).or_raise(read_error);
        }
        for legacy in &self.legacy {
            let Some(value) = legacy.get(key).await.or_raise(read_error)? else {
                continue;
            };
            let decoded = decode(&value).or_raise(read_error)?;
            tracing::info!(key, from = legacy.name(), to = self.primary.name(), "Migrating value from legacy store");
            if let Err(err) = self.primary.put(key, value).await {
                // The caller's own write will most likely fail the same way,
                // and that one is surfaced.
                tracing::warn!(key, store = self.primary.name(), error = ?err, "Failed to migrate value");
            }
            return Ok(Some(decoded));
        }
        Ok(None)
    }

    /// Write a value to the primary store.
    pub async fn write(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.primary.put(key, value.into()).await.or_raise(|| ErrorKind::StorageWrite(key.to_string()))
    }
}

/// Decode a stored build number.
///
/// Integers are build numbers as-is. Strings are accepted if they are the
/// [`RESET_VERSION`] sentinel (build `0`) or a plain number. Anything else,
/// including negative integers, is invalid.
pub fn decode_build(key: &str, value: &Value) -> StoreResult<BuildNumber> {
    match value {
        Value::Str(s) if s == RESET_VERSION => Ok(0),
        Value::Str(s) => s.parse::<BuildNumber>().or_raise(|| StoreErrorKind::InvalidData(key.to_string())),
        other => {
            let number = other.expect_int(key)?;
            BuildNumber::try_from(number).or_raise(|| StoreErrorKind::InvalidData(key.to_string()))
        },
    }
}

/// Substitute `default` for a value that is absent or couldn't be read.
///
/// # Examples
///
/// ```
/// use firstrun_tracker::or_default;
/// assert!(!or_default("is_first_run", Ok(Some(false)), true));
/// assert!(or_default("is_first_run", Ok(None), true));
/// ```
pub fn or_default<T: Debug>(key: &str, read: Result<Option<T>>, default: T) -> T {
    match read {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(err) => {
            tracing::warn!(key, error = ?err, ?default, "Unreadable value; using default");
            default
        },
    }
}
