//! Key-value storage for firstrun flags.
//!
//! A store is a durable mapping from a string key to a small [`Value`]
//! (boolean, integer or string) that survives process restarts. Backends:
//! - [`SqliteStore`](backend::SqliteStore): the structured store, and the
//!   default primary.
//! - [`FileStore`](backend::FileStore): a flat JSON preferences file, the
//!   historical backend that installations are migrating away from.
//! - [`ReadOnlyStore`](backend::ReadOnlyStore): wraps another store and drops
//!   writes.
//! - `MemoryStore` (feature `mock`): in-memory store for tests.

pub mod backend;
pub mod error;
mod key;
mod value;

pub use crate::backend::KeyValueStore;
pub use crate::key::{MAX_KEY_LENGTH, validate as validate_key};
pub use crate::value::{Value, ValueKind};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn KeyValueStore + Send + Sync>;
