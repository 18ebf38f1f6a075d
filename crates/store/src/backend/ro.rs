//! Read-only storage backend.
//!
//! This module provides a store implementation that wraps other
//! implementations and prevents write operations from executing, but
//! indicating success on return.

use async_trait::async_trait;

use crate::{KeyValueStore, StoreHandle, Value, error::Result};

/// Read-only store.
///
/// Wraps another store and silently drops all writes, logging an
/// [`info event`](tracing::Event). Legacy stores are wrapped in this so that
/// nothing can write to them by accident.
#[derive(Clone)]
pub struct ReadOnlyStore {
    inner: StoreHandle,
}
impl ReadOnlyStore {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        tracing::info!(store = self.name(), key, kind = %value.kind(), "Skipping write to read-only store");
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        self.inner.contains(key).await
    }
}
