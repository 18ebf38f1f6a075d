//! Build a tracker from configuration.

use crate::build::{BuildHandle, FixedBuild, PackageBuild};
use crate::error::{ErrorKind, Result};
use crate::sources::Sources;
use crate::tracker::FirstRunTracker;
use exn::ResultExt;
use firstrun_config::{BuildConfig, Config, StoreConfig};
use firstrun_store::StoreHandle;
use firstrun_store::backend::{FileStore, SqliteStore};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

/// Open the configured stores and build provider.
///
/// The legacy store, if any, is only ever read from.
#[instrument(skip_all, fields(primary = %config.primary.path().display()))]
pub async fn open(config: &Config) -> Result<FirstRunTracker> {
    let mut sources = Sources::new(open_store("primary", &config.primary).await?);
    if let Some(legacy) = &config.legacy {
        sources = sources.with_legacy(open_store("legacy", legacy).await?);
    }
    let build: BuildHandle = match &config.build {
        BuildConfig::Fixed { number } => Arc::new(FixedBuild(*number)),
        BuildConfig::Package { version } => Arc::new(PackageBuild::new(version.clone())),
    };
    Ok(FirstRunTracker::new(sources, build))
}

/// Load configuration (defaults, optional file, environment) and
/// [`open()`] it.
pub async fn open_from_file(file: Option<&Path>) -> Result<FirstRunTracker> {
    let config = Config::load(file).or_raise(|| ErrorKind::Config)?;
    open(&config).await
}

async fn open_store(name: &str, config: &StoreConfig) -> Result<StoreHandle> {
    let store: StoreHandle = match config {
        StoreConfig::Sqlite { path } => {
            Arc::new(SqliteStore::connect(path).await.or_raise(|| ErrorKind::Open)?.with_name(name))
        },
        StoreConfig::File { path } => Arc::new(FileStore::new(name, path).or_raise(|| ErrorKind::Open)?),
    };
    tracing::debug!(store = name, path = %config.path().display(), "Opened store");
    Ok(store)
}
