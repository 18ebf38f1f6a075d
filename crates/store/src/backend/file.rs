//! JSON preferences file backend.
//!
//! This module provides a store implementation that keeps every key in a
//! single flat JSON object on the local filesystem, the way simple
//! preferences stores do. Files are accessed using `tokio::fs` for async I/O.

use crate::error::{ErrorKind, Result};
use crate::{KeyValueStore, Value, validate_key};
use async_trait::async_trait;
use exn::ResultExt;
use serde_json::{Map, Value as Json};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

type Document = Map<String, Json>;

/// JSON preferences file store.
///
/// All keys live in one JSON object. A missing (or empty) file reads as an
/// empty store. Values that don't map onto a [`Value`] are reported per key as
/// [`InvalidData`](ErrorKind::InvalidData); a file that isn't a JSON object at
/// all is [`Corrupt`](ErrorKind::Corrupt) when read, and is replaced by the
/// next write.
///
/// # Examples
///
/// ```no_run
/// use firstrun_store::backend::FileStore;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FileStore::new("prefs", "/var/lib/app/shared_prefs.json")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileStore {
    name: String,
    /// Location of the JSON document
    path: PathBuf,
    /// Serializes read-modify-write cycles of `put()` within this process.
    write_lock: Mutex<()>,
}
impl FileStore {
    /// Create a new preferences file store.
    ///
    /// The file itself is created on first write.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute or points at a directory.
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_absolute() || path.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(path));
        }
        Ok(Self { name: name.into(), path, write_lock: Mutex::new(()) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    fn temporary_path(&self) -> PathBuf {
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    async fn load(&self) -> Result<Document> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => exn::bail!(Self::map_io_error(e, &self.path)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Document::new());
        }
        match serde_json::from_slice::<Json>(&bytes).or_raise(|| ErrorKind::Corrupt(self.path.clone()))? {
            Json::Object(document) => Ok(document),
            _ => exn::bail!(ErrorKind::Corrupt(self.path.clone())),
        }
    }

    /// Write the whole document to a sibling file, then rename it into
    /// place so readers never observe a half-written file.
    async fn save(&self, document: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document).or_raise(|| ErrorKind::Corrupt(self.path.clone()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, parent))?;
        }
        let tmp = self.temporary_path();
        fs::write(&tmp, bytes).await.map_err(|e| Self::map_io_error(e, &tmp))?;
        Ok(fs::rename(&tmp, &self.path).await.map_err(|e| Self::map_io_error(e, &self.path))?)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = validate_key(key)?;
        let Some(json) = self.load().await?.remove(key) else {
            return Ok(None);
        };
        match Value::try_from(json) {
            Ok(value) => Ok(Some(value)),
            Err(_) => exn::bail!(ErrorKind::InvalidData(key.to_string())),
        }
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let key = validate_key(key)?;
        let _guard = self.write_lock.lock().await;
        let mut document = match self.load().await {
            Ok(document) => document,
            Err(err) if matches!(&*err, ErrorKind::Corrupt(_)) => {
                tracing::warn!(store = %self.name, path = %self.path.display(), error = ?err, "Replacing corrupt preferences file");
                Document::new()
            },
            Err(err) => return Err(err),
        };
        document.insert(key.to_string(), value.into());
        self.save(&document).await
    }
}
