//! In-memory store for testing.

use crate::error::{ErrorKind, Result};
use crate::{KeyValueStore, Value, validate_key};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Error as IoError;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory store for testing.
///
/// Entries are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Reads and writes
/// can be switched to fail on demand, to exercise error paths of callers.
///
/// # Examples
///
/// ```
/// use firstrun_store::{KeyValueStore, Value, backend::MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::with_entries([("version", Value::Int(10))]);
/// assert_eq!(store.get("version").await?, Some(Value::Int(10)));
///
/// store.put("is_first_run", Value::Bool(false)).await?;
/// assert!(store.contains("is_first_run").await?);
/// # Ok(())
/// # }
/// ```
pub struct MemoryStore {
    name: String,
    entries: RwLock<HashMap<String, Value>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create a memory store pre-populated with entries.
    ///
    /// Panics if any key fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_entries(entries: impl IntoIterator<Item = (impl Into<String>, impl Into<Value>)>) -> Self {
        let mut map = HashMap::new();
        for (key, value) in entries {
            let key = key.into();
            if validate_key(&key).is_err() {
                // The panic here is DELIBERATE. MemoryStore is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MemoryStore::with_entries: invalid key {key:?}");
            }
            map.insert(key, value.into());
        }
        Self {
            name: "memory".to_string(),
            entries: RwLock::new(map),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Change the name of the memory store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every subsequent read fail with
    /// [`InvalidData`](ErrorKind::InvalidData).
    pub fn set_failing_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with [`Io`](ErrorKind::Io).
    pub fn set_failing_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of everything currently stored.
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.entries.read().await.clone()
    }
}
impl Default for MemoryStore {
    fn default() -> Self {
        let entries: [(&str, Value); 0] = [];
        Self::with_entries(entries)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = validate_key(key)?;
        if self.fail_reads.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::InvalidData(key.to_string()));
        }
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let key = validate_key(key)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Io(IoError::other("simulated write failure")));
        }
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::default();
        assert_eq!(store.get("is_first_call").await.unwrap(), None);
        store.put("is_first_call", Value::Bool(false)).await.unwrap();
        assert_eq!(store.get("is_first_call").await.unwrap(), Some(Value::Bool(false)));
    }

    #[tokio::test]
    async fn test_with_entries() {
        let store = MemoryStore::with_entries([("version", Value::Int(3)), ("is_first_run", Value::Bool(true))]);
        assert_eq!(store.snapshot().await.len(), 2);
        assert_eq!(store.get("version").await.unwrap(), Some(Value::Int(3)));
    }

    #[test]
    #[should_panic(expected = "invalid key")]
    fn test_with_entries_rejects_invalid_keys() {
        MemoryStore::with_entries([("", Value::Bool(true))]);
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let store = MemoryStore::with_entries([("version", Value::Int(3))]);
        store.set_failing_reads(true);
        let err = store.get("version").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
        store.set_failing_reads(false);
        store.set_failing_writes(true);
        let err = store.put("version", Value::Int(4)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Io(_)));
        assert_eq!(store.get("version").await.unwrap(), Some(Value::Int(3)));
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let store = MemoryStore::default();
        assert!(store.get("a\0b").await.is_err());
        assert!(store.put("", Value::Bool(true)).await.is_err());
    }
}
