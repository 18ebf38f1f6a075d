//! Key-value store trait and implementations.
//!
//! This module defines the `KeyValueStore` trait, which provides a unified
//! interface for reading and writing flags across different backends (SQLite
//! database, JSON preferences file, memory).

mod file;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;
mod sqlite;

pub use self::file::FileStore;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MemoryStore;
pub use self::ro::ReadOnlyStore;
pub use self::sqlite::SqliteStore;
use crate::Value;
use crate::error::Result;
use async_trait::async_trait;

/// Unified interface for key-value store backends.
///
/// All operations are asynchronous since most backends need I/O. Individual
/// key writes are serialized by each backend, but nothing makes a `get`
/// followed by a `put` atomic.
///
/// # Keys
/// Keys must pass [`validate_key`](crate::validate_key). Implementations
/// should enforce this validation.
///
/// # Examples
///
/// ```
/// use firstrun_store::{KeyValueStore, Value, error::Result};
///
/// async fn flip(store: &dyn KeyValueStore, key: &str) -> Result<bool> {
///     let current = match store.get(key).await? {
///         Some(value) => value.expect_bool(key)?,
///         None => false,
///     };
///     store.put(key, Value::Bool(!current)).await?;
///     Ok(!current)
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Name of the store, used for logging only.
    fn name(&self) -> &str;

    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written. Returns
    /// [`InvalidData`](crate::error::ErrorKind::InvalidData) if something is
    /// stored but can't be decoded into a [`Value`].
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Create or overwrite the value stored under `key`.
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Check if a key has a value.
    ///
    /// Default implementation of this method reads the value and discards it.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
