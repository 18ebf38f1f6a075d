//! The first-run state machine.

use crate::build::{BuildHandle, BuildNumber};
use crate::error::Result;
use crate::keys::{DEFAULT_BUILD, DEFAULT_FLAG, IS_FIRST_CALL, IS_FIRST_RUN, RESET_VERSION, VERSION};
use crate::sources::{Sources, or_default};
use std::sync::OnceLock;
use tokio::sync::OnceCell;
use tracing::instrument;

/// Answers "has this happened before on this installation?" for app runs,
/// individual calls and build upgrades.
///
/// Construct one tracker per process and share it. Values memoized by a
/// tracker live exactly as long as the tracker does, so a fresh tracker over
/// the same stores behaves like a restarted process.
///
/// | Operation | Sticky for the tracker's lifetime |
/// |---|---|
/// | [`is_first_run()`](Self::is_first_run) | yes |
/// | [`is_first_run_since()`](Self::is_first_run_since) | yes |
/// | [`is_first_call()`](Self::is_first_call) | no |
/// | [`is_first_call_since()`](Self::is_first_call_since) | no |
///
/// Every query also marks its event as seen in the primary store, so even a
/// query whose answer is cached can change what the *next* tracker sees.
/// Failed reads fall back to defaults; failed writes are returned as
/// [`StorageWrite`](crate::error::ErrorKind::StorageWrite) errors.
///
/// There is no locking between a query's read and its write: two concurrent
/// [`is_first_call()`](Self::is_first_call) can both return `true`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use firstrun_store::backend::SqliteStore;
/// use firstrun_tracker::{FirstRunTracker, FixedBuild, Sources};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(SqliteStore::connect_in_memory().await?);
/// let tracker = FirstRunTracker::new(Sources::new(store), Arc::new(FixedBuild(120)));
///
/// if tracker.is_first_run().await? {
///     println!("Welcome!");
/// }
/// if tracker.is_first_run_since(118).await? {
///     println!("Here's what changed in build 118...");
/// }
/// # Ok(())
/// # }
/// ```
pub struct FirstRunTracker {
    sources: Sources,
    build: BuildHandle,
    first_run: OnceLock<bool>,
    previous_build: OnceLock<BuildNumber>,
    current_build: OnceCell<BuildNumber>,
}

impl FirstRunTracker {
    pub fn new(sources: Sources, build: BuildHandle) -> Self {
        Self {
            sources,
            build,
            first_run: OnceLock::new(),
            previous_build: OnceLock::new(),
            current_build: OnceCell::new(),
        }
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    /// Build number of the running binary, asked of the provider only once.
    pub async fn current_build(&self) -> BuildNumber {
        *self.current_build.get_or_init(|| self.build.current_build_number()).await
    }

    /// `true` on the very first call since install or [`reset()`](Self::reset),
    /// `false` on every call after that, across any number of trackers.
    #[instrument(skip(self))]
    pub async fn is_first_call(&self) -> Result<bool> {
        let first = or_default(IS_FIRST_CALL, self.sources.read_flag(IS_FIRST_CALL).await, DEFAULT_FLAG);
        self.sources.write(IS_FIRST_CALL, false).await?;
        Ok(first)
    }

    /// `true` if the app has reached `build` and the previous "since" query
    /// (of either kind) recorded a build below it.
    ///
    /// Not memoized: every call records the current build, so calling again
    /// with the same `build` returns `false`.
    #[instrument(skip(self))]
    pub async fn is_first_call_since(&self, build: BuildNumber) -> Result<bool> {
        let current = self.current_build().await;
        let last = or_default(VERSION, self.sources.read_build(VERSION).await, DEFAULT_BUILD);
        self.sources.write(VERSION, current).await?;
        Ok(crossed(current, last, build))
    }

    /// `true` for every call on a tracker created when no run had been
    /// recorded yet (fresh install or after [`reset()`](Self::reset)).
    ///
    /// Only the first call touches the store; its answer is cached for the
    /// lifetime of the tracker.
    #[instrument(skip(self))]
    pub async fn is_first_run(&self) -> Result<bool> {
        if let Some(first) = self.first_run.get() {
            return Ok(*first);
        }
        let first = or_default(IS_FIRST_RUN, self.sources.read_flag(IS_FIRST_RUN).await, DEFAULT_FLAG);
        self.sources.write(IS_FIRST_RUN, false).await?;
        // A concurrent first call may have won the race; stick with its answer.
        Ok(*self.first_run.get_or_init(|| first))
    }

    /// Like [`is_first_call_since()`](Self::is_first_call_since), but the
    /// previously recorded build is read only once per tracker, so the answer
    /// stays the same for the tracker's lifetime.
    #[instrument(skip(self))]
    pub async fn is_first_run_since(&self, build: BuildNumber) -> Result<bool> {
        let current = self.current_build().await;
        let previous = match self.previous_build.get() {
            Some(previous) => *previous,
            None => {
                let observed = or_default(VERSION, self.sources.read_build(VERSION).await, DEFAULT_BUILD);
                let previous = *self.previous_build.get_or_init(|| observed);
                self.sources.write(VERSION, current).await?;
                previous
            },
        };
        Ok(crossed(current, previous, build))
    }

    /// Restore every stored key to its first-run state.
    ///
    /// Values already memoized by this tracker are kept; use
    /// [`reinitialize()`](Self::reinitialize) or a new tracker to observe the
    /// reset through [`is_first_run()`](Self::is_first_run) and
    /// [`is_first_run_since()`](Self::is_first_run_since).
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<()> {
        tokio::try_join!(
            self.sources.write(IS_FIRST_RUN, true),
            self.sources.write(IS_FIRST_CALL, true),
            self.sources.write(VERSION, RESET_VERSION),
        )?;
        tracing::info!(store = self.sources.primary().name(), "First-run state reset");
        Ok(())
    }

    /// Forget everything memoized, as if the process had restarted.
    pub fn reinitialize(&mut self) {
        self.first_run.take();
        self.previous_build.take();
        self.current_build.take();
    }
}

fn crossed(current: BuildNumber, previous: BuildNumber, threshold: BuildNumber) -> bool {
    current >= threshold && previous < threshold
}
