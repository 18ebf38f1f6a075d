//! SQLite storage backend.

use async_trait::async_trait;
use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::{KeyValueStore, Value, validate_key};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
const POOL_SIZE: u32 = 2;
const BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

/// SQLite-backed store.
///
/// One row per key in the `entries` table. Each row carries a type tag next
/// to its textual payload, so values come back with the type they were
/// written with.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    name: String,
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path` and bring its
    /// schema up to date.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        }
        Self::open(Self::options().filename(path).create_if_missing(true), POOL_SIZE).await
    }

    /// Private database that disappears with the store. Available outside
    /// tests so dependent crates can use it in theirs.
    pub async fn connect_in_memory() -> Result<Self> {
        // Every connection to `:memory:` gets its own database.
        Self::open(Self::options().filename(":memory:"), 1).await
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for in-flight queries, then close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn open(options: SqliteConnectOptions, pool_size: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let store = Self { name: "sqlite".to_string(), pool };
        store.migrate().await?;
        Ok(store)
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            // A lost flag update is a wrong answer on the next launch.
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(BUSY_TIMEOUT)
            .pragma("temp_store", "memory")
    }

    #[instrument("migrating store schema", skip(self), fields(store = %self.name))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = validate_key(key)?;
        let row: Option<(String, String)> = sqlx::query_as("SELECT kind, value FROM entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            None => Ok(None),
            Some((kind, payload)) => match Value::decode(&kind, &payload) {
                Some(value) => Ok(Some(value)),
                None => exn::bail!(ErrorKind::InvalidData(key.to_string())),
            },
        }
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let key = validate_key(key)?;
        let (kind, payload) = value.encode();
        sqlx::query(
            r#"
                INSERT INTO entries (key, kind, value, updated_at)
                VALUES (?, ?, ?, CURRENT_TIMESTAMP)
                ON CONFLICT (key) DO UPDATE SET
                    kind = excluded.kind,
                    value = excluded.value,
                    updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(kind)
        .bind(payload)
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}
