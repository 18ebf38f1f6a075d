//! Install, restart, upgrade and reset lifecycles, each new tracker over the
//! same store standing in for a new process.

use async_trait::async_trait;
use firstrun_store::backend::{FileStore, MemoryStore, SqliteStore};
use firstrun_store::error::Result as StoreResult;
use firstrun_store::{KeyValueStore, StoreHandle, Value};
use firstrun_tracker::keys::{IS_FIRST_CALL, IS_FIRST_RUN, VERSION};
use firstrun_tracker::{BuildNumber, FirstRunTracker, FixedBuild, Sources};
use std::path::Path;
use std::sync::Arc;

fn process(store: &StoreHandle, build: BuildNumber) -> FirstRunTracker {
    FirstRunTracker::new(Sources::new(store.clone()), Arc::new(FixedBuild(build)))
}

async fn open_persisted(database: &Path, prefs: &Path) -> FirstRunTracker {
    let primary: StoreHandle = Arc::new(SqliteStore::connect(database).await.unwrap());
    let legacy: StoreHandle = Arc::new(FileStore::new("prefs", prefs).unwrap());
    FirstRunTracker::new(Sources::new(primary).with_legacy(legacy), Arc::new(FixedBuild(3)))
}

/// Yields to the runtime after every read, so joined futures interleave
/// between their read and their write.
struct YieldingStore(MemoryStore);

#[async_trait]
impl KeyValueStore for YieldingStore {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let value = self.0.get(key).await;
        tokio::task::yield_now().await;
        value
    }

    async fn put(&self, key: &str, value: Value) -> StoreResult<()> {
        self.0.put(key, value).await
    }
}

fn memory(entries: impl IntoIterator<Item = (&'static str, Value)>) -> StoreHandle {
    Arc::new(MemoryStore::with_entries(entries))
}

#[tokio::test]
async fn first_run_is_sticky_until_restart() {
    let store = memory([]);
    let first = process(&store, 1);
    assert!(first.is_first_run().await.unwrap());
    assert!(first.is_first_run().await.unwrap());
    assert!(first.is_first_run().await.unwrap());

    let second = process(&store, 1);
    assert!(!second.is_first_run().await.unwrap());
    assert!(!second.is_first_run().await.unwrap());
}

#[tokio::test]
async fn first_call_is_true_exactly_once() {
    let store = memory([]);
    let first = process(&store, 1);
    assert!(first.is_first_call().await.unwrap());
    assert!(!first.is_first_call().await.unwrap());
    for _ in 0..3 {
        let restarted = process(&store, 1);
        assert!(!restarted.is_first_call().await.unwrap());
    }
}

#[tokio::test]
async fn first_call_since_is_not_sticky() {
    let store = memory([(VERSION, Value::Int(0))]);
    let tracker = process(&store, 10);
    assert!(tracker.is_first_call_since(5).await.unwrap());
    assert!(!tracker.is_first_call_since(5).await.unwrap());
    assert!(!process(&store, 10).is_first_call_since(5).await.unwrap());
}

#[tokio::test]
async fn first_run_since_is_sticky_until_restart() {
    let store = memory([(VERSION, Value::Int(0))]);
    let tracker = process(&store, 10);
    assert!(tracker.is_first_run_since(5).await.unwrap());
    assert!(tracker.is_first_run_since(5).await.unwrap());
    assert_eq!(store.get(VERSION).await.unwrap(), Some(Value::Int(10)));
    assert!(!process(&store, 10).is_first_run_since(5).await.unwrap());
}

#[tokio::test]
async fn since_queries_before_reaching_the_build() {
    let store = memory([]);
    assert!(!process(&store, 4).is_first_run_since(5).await.unwrap());
    // Upgrade past the threshold.
    let upgraded = process(&store, 6);
    assert!(upgraded.is_first_run_since(5).await.unwrap());
    assert!(!upgraded.is_first_run_since(7).await.unwrap());
    assert!(!process(&store, 6).is_first_run_since(5).await.unwrap());
}

#[tokio::test]
async fn each_threshold_is_crossed_once() {
    let store = memory([(VERSION, Value::Int(3))]);
    let tracker = process(&store, 10);
    // Crossed since build 3 was recorded, then recorded as 10.
    assert!(tracker.is_first_call_since(8).await.unwrap());
    assert!(!tracker.is_first_call_since(9).await.unwrap());
    assert!(!tracker.is_first_call_since(11).await.unwrap());
}

#[tokio::test]
async fn reset_restores_first_run_state() {
    let store = memory([]);
    let tracker = process(&store, 10);
    assert!(tracker.is_first_call().await.unwrap());
    assert!(tracker.is_first_run().await.unwrap());
    assert!(tracker.is_first_run_since(5).await.unwrap());

    let restarted = process(&store, 10);
    assert!(!restarted.is_first_call().await.unwrap());
    assert!(!restarted.is_first_run().await.unwrap());
    assert!(!restarted.is_first_run_since(5).await.unwrap());

    restarted.reset().await.unwrap();
    // Not memoized, so visible straight away.
    assert!(restarted.is_first_call().await.unwrap());
    // Memoized before the reset.
    assert!(!restarted.is_first_run().await.unwrap());
    assert!(!restarted.is_first_run_since(5).await.unwrap());

    let after_reset = process(&store, 10);
    assert!(after_reset.is_first_run().await.unwrap());
    assert!(after_reset.is_first_run_since(5).await.unwrap());
    assert!(!after_reset.is_first_call().await.unwrap());
}

#[tokio::test]
async fn side_effects_are_read_back_by_next_process() {
    let store = memory([]);
    let tracker = process(&store, 21);
    tracker.is_first_run().await.unwrap();
    tracker.is_first_call().await.unwrap();
    tracker.is_first_call_since(1).await.unwrap();
    assert_eq!(store.get(IS_FIRST_RUN).await.unwrap(), Some(Value::Bool(false)));
    assert_eq!(store.get(IS_FIRST_CALL).await.unwrap(), Some(Value::Bool(false)));
    assert_eq!(store.get(VERSION).await.unwrap(), Some(Value::Int(21)));

    tracker.reset().await.unwrap();
    assert_eq!(store.get(IS_FIRST_RUN).await.unwrap(), Some(Value::Bool(true)));
    assert_eq!(store.get(IS_FIRST_CALL).await.unwrap(), Some(Value::Bool(true)));
    assert_eq!(store.get(VERSION).await.unwrap(), Some(Value::Str("0.0.0".to_string())));
}

#[tokio::test]
async fn legacy_values_migrate_into_primary() {
    let primary = memory([]);
    let legacy = memory([(IS_FIRST_RUN, Value::Bool(true)), (VERSION, Value::Int(8))]);
    let sources = Sources::new(primary.clone()).with_legacy(legacy.clone());
    assert_eq!(sources.read_flag(IS_FIRST_RUN).await.unwrap(), Some(true));
    assert_eq!(primary.get(IS_FIRST_RUN).await.unwrap(), Some(Value::Bool(true)));

    let tracker = FirstRunTracker::new(sources, Arc::new(FixedBuild(9)));
    assert!(tracker.is_first_run().await.unwrap());
    assert!(tracker.is_first_run_since(9).await.unwrap());
    assert!(!tracker.is_first_run_since(8).await.unwrap());
    assert_eq!(primary.get(IS_FIRST_RUN).await.unwrap(), Some(Value::Bool(false)));
    assert_eq!(legacy.get(IS_FIRST_RUN).await.unwrap(), Some(Value::Bool(true)));
}

#[tokio::test]
async fn persisted_across_reopened_stores() {
    let temp_dir = tempfile::tempdir().unwrap();
    let database = temp_dir.path().join("firstrun.db");
    let prefs = temp_dir.path().join("prefs.json");
    std::fs::write(&prefs, br#"{"is_first_call": false}"#).unwrap();

    let first = open_persisted(&database, &prefs).await;
    assert!(first.is_first_run().await.unwrap());
    assert!(!first.is_first_call().await.unwrap());
    assert!(first.is_first_run_since(2).await.unwrap());
    drop(first);

    let second = open_persisted(&database, &prefs).await;
    assert!(!second.is_first_run().await.unwrap());
    assert!(!second.is_first_run_since(2).await.unwrap());
    second.reset().await.unwrap();
    drop(second);

    let third = open_persisted(&database, &prefs).await;
    assert!(third.is_first_run().await.unwrap());
    assert!(third.is_first_call().await.unwrap());
    assert!(third.is_first_run_since(2).await.unwrap());
}

#[tokio::test]
async fn concurrent_first_calls_can_both_win() {
    let store: StoreHandle = Arc::new(YieldingStore(MemoryStore::default()));
    let tracker = process(&store, 1);
    let (a, b) = tokio::join!(tracker.is_first_call(), tracker.is_first_call());
    assert!(a.unwrap());
    assert!(b.unwrap());
    assert!(!process(&store, 1).is_first_call().await.unwrap());
}

#[tokio::test]
async fn corrupt_primary_file_is_recovered() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("flags.json");
    std::fs::write(&path, b"{not json").unwrap();
    let open = || -> FirstRunTracker {
        let store: StoreHandle = Arc::new(FileStore::new("flags", &path).unwrap());
        process(&store, 4)
    };

    let first = open();
    assert!(first.is_first_call().await.unwrap());
    assert!(first.is_first_run().await.unwrap());
    assert!(first.is_first_run_since(2).await.unwrap());

    let second = open();
    assert!(!second.is_first_call().await.unwrap());
    assert!(!second.is_first_run().await.unwrap());
    assert!(!second.is_first_run_since(2).await.unwrap());
}
