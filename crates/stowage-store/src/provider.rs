use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use stowage_convert::{Converter, JsonConverter, TypeTag};
use stowage_slot::{is_temp_file_name, key_from_file_name, FileSlot, SyncMode};

use crate::config::ProviderConfig;
use crate::error::{StoreError, StoreResult};
use crate::list::ListStore;
use crate::schedule::IoScheduler;
use crate::traits::StoreItem;
use crate::value::ValueStore;

/// Type-erased view of a cached store.
trait RegisteredStore: Send + Sync {
    fn is_deleted(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: StoreItem, C: Converter> RegisteredStore for ValueStore<T, C> {
    fn is_deleted(&self) -> bool {
        ValueStore::is_deleted(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: StoreItem, C: Converter> RegisteredStore for ListStore<T, C> {
    fn is_deleted(&self) -> bool {
        ListStore::is_deleted(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Registered {
    tag: TypeTag,
    store: Box<dyn RegisteredStore>,
}

struct ProviderInner<C> {
    root: PathBuf,
    converter: Arc<C>,
    scheduler: IoScheduler,
    sync_mode: SyncMode,
    registry: Mutex<HashMap<String, Registered>>,
}

/// Configures and opens a [`StoreProvider`].
///
/// ```no_run
/// use stowage_store::{IoScheduler, JsonConverter, StoreProvider, SyncMode};
///
/// let provider = StoreProvider::builder("/tmp/stores")
///     .scheduling_with(IoScheduler::CurrentRuntime)
///     .sync_mode(SyncMode::EveryWrite)
///     .using(JsonConverter::new())
///     .unwrap();
/// let dino = provider.value_store::<String>("dino").unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct StoreProviderBuilder {
    root: PathBuf,
    scheduler: IoScheduler,
    sync_mode: SyncMode,
}

impl StoreProviderBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = ProviderConfig::default();
        Self {
            root: root.into(),
            scheduler: IoScheduler::default(),
            sync_mode: defaults.sync_mode,
        }
    }

    /// Start from a loaded configuration.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.root.clone()).sync_mode(config.sync_mode)
    }

    /// Where `observe_*` calls run their file I/O.
    pub fn scheduling_with(mut self, scheduler: IoScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    /// Finish with `converter`, creating the root directory if needed.
    pub fn using<C: Converter>(self, converter: C) -> StoreResult<StoreProvider<C>> {
        fs::create_dir_all(&self.root)?;
        info!(root = %self.root.display(), "store provider opened");
        Ok(StoreProvider {
            inner: Arc::new(ProviderInner {
                root: self.root,
                converter: Arc::new(converter),
                scheduler: self.scheduler,
                sync_mode: self.sync_mode,
                registry: Mutex::new(HashMap::new()),
            }),
        })
    }
}

/// Factory and registry for stores under one root directory.
///
/// Each key maps to exactly one live store: asking twice for the same key
/// returns handles to the same instance, sharing its lock and event stream.
/// Once a store is deleted, the next request for its key builds a fresh
/// store; handles to the deleted one keep failing with
/// [`StoreError::StoreDeleted`].
///
/// The registry lives as long as the provider (and its clones).
pub struct StoreProvider<C = JsonConverter> {
    inner: Arc<ProviderInner<C>>,
}

impl<C> Clone for StoreProvider<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl StoreProvider<JsonConverter> {
    pub fn builder(root: impl Into<PathBuf>) -> StoreProviderBuilder {
        StoreProviderBuilder::new(root)
    }

    /// Open a JSON-backed provider from configuration.
    pub fn from_config(config: &ProviderConfig) -> StoreResult<Self> {
        let converter = if config.pretty_json {
            JsonConverter::pretty()
        } else {
            JsonConverter::new()
        };
        StoreProviderBuilder::from_config(config).using(converter)
    }
}

impl<C: Converter> StoreProvider<C> {
    /// The value store for `key`, created on first use.
    ///
    /// Fails with [`StoreError::TypeMismatch`] if `key` is already in use by
    /// a list store or by a value store of another type.
    pub fn value_store<T: StoreItem>(&self, key: &str) -> StoreResult<ValueStore<T, C>> {
        self.store_for(key, TypeTag::value::<T>(), |slot| {
            ValueStore::new(
                key.to_string(),
                slot,
                Arc::clone(&self.inner.converter),
                self.inner.scheduler.clone(),
            )
        })
    }

    /// The list store for `key`, created on first use.
    ///
    /// Fails with [`StoreError::TypeMismatch`] if `key` is already in use by
    /// a value store or by a list store of another element type.
    pub fn list_store<T: StoreItem>(&self, key: &str) -> StoreResult<ListStore<T, C>> {
        self.store_for(key, TypeTag::list_of::<T>(), |slot| {
            ListStore::new(
                key.to_string(),
                slot,
                Arc::clone(&self.inner.converter),
                self.inner.scheduler.clone(),
            )
        })
    }

    fn store_for<S, F>(&self, key: &str, tag: TypeTag, create: F) -> StoreResult<S>
    where
        S: RegisteredStore + Clone + 'static,
        F: FnOnce(FileSlot) -> S,
    {
        let mut registry = self.inner.registry.lock().expect("registry lock poisoned");

        if let Some(entry) = registry.get(key) {
            if !entry.store.is_deleted() {
                return match entry.store.as_any().downcast_ref::<S>() {
                    Some(store) => Ok(store.clone()),
                    None => Err(StoreError::TypeMismatch {
                        key: key.to_string(),
                        expected: tag.to_string(),
                        found: entry.tag.to_string(),
                    }),
                };
            }
            debug!(key, "replacing deleted store");
        }

        let slot = FileSlot::for_key(&self.inner.root, key, self.inner.sync_mode)?;
        let store = create(slot);
        debug!(key, tag = %tag, "store created");
        registry.insert(
            key.to_string(),
            Registered {
                tag,
                store: Box::new(store.clone()),
            },
        );
        Ok(store)
    }

    pub fn converter(&self) -> &C {
        &self.inner.converter
    }
}

impl<C> StoreProvider<C> {
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Keys with a live (not deleted) store in this provider, sorted.
    pub fn keys(&self) -> Vec<String> {
        let registry = self.inner.registry.lock().expect("registry lock poisoned");
        let mut keys: Vec<String> = registry
            .iter()
            .filter(|(_, entry)| !entry.store.is_deleted())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Returns `true` if a live store for `key` is cached.
    pub fn contains(&self, key: &str) -> bool {
        let registry = self.inner.registry.lock().expect("registry lock poisoned");
        registry
            .get(key)
            .is_some_and(|entry| !entry.store.is_deleted())
    }

    /// Keys of the store files present in the root directory, sorted.
    ///
    /// Includes stores written by earlier processes. Files whose key cannot
    /// be recovered (hashed long keys, temporary files) are skipped.
    pub fn stored_keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.inner.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if is_temp_file_name(name) {
                debug!(name, "skipping leftover temporary file");
                continue;
            }
            if let Some(key) = key_from_file_name(name) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl<C> std::fmt::Debug for StoreProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .inner
            .registry
            .lock()
            .expect("registry lock poisoned")
            .len();
        f.debug_struct("StoreProvider")
            .field("root", &self.inner.root)
            .field("store_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ListStoreEvent, ValueStoreEvent};
    use crate::stream::TryNext;
    use crate::testutil::{dino, Dino};
    use stowage_convert::BincodeConverter;

    fn temp_provider() -> (tempfile::TempDir, StoreProvider) {
        let dir = tempfile::tempdir().unwrap();
        let provider = StoreProvider::builder(dir.path())
            .scheduling_with(IoScheduler::Inline)
            .using(JsonConverter::new())
            .unwrap();
        (dir, provider)
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    #[test]
    fn same_key_returns_same_instance() {
        let (_dir, provider) = temp_provider();
        let first = provider.value_store::<Dino>("dino").unwrap();
        let second = provider.value_store::<Dino>("dino").unwrap();

        let mut events = first.events();
        second.put(dino("Rex", 4)).unwrap();
        assert_eq!(
            events.try_next(),
            TryNext::Event(ValueStoreEvent::Put(dino("Rex", 4)))
        );
        assert_eq!(second.subscriber_count(), 1);
    }

    #[test]
    fn clones_share_the_registry() {
        let (_dir, provider) = temp_provider();
        let other = provider.clone();
        let list = provider.list_store::<Dino>("dinoList").unwrap();
        let mut events = list.events();

        other
            .list_store::<Dino>("dinoList")
            .unwrap()
            .add_to_list(dino("Rex", 4))
            .unwrap();
        assert_eq!(
            events.try_next(),
            TryNext::Event(ListStoreEvent::ItemAdded(vec![dino("Rex", 4)]))
        );
    }

    #[test]
    fn different_value_type_is_rejected() {
        let (_dir, provider) = temp_provider();
        provider.value_store::<Dino>("dino").unwrap();

        let err = provider.value_store::<String>("dino").unwrap_err();
        match err {
            StoreError::TypeMismatch { key, found, .. } => {
                assert_eq!(key, "dino");
                assert!(found.contains("Dino"), "found: {found}");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn value_and_list_kinds_do_not_mix() {
        let (_dir, provider) = temp_provider();
        provider.value_store::<Dino>("dino").unwrap();
        provider.list_store::<Dino>("dinoList").unwrap();

        assert!(matches!(
            provider.list_store::<Dino>("dino"),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert!(matches!(
            provider.value_store::<Dino>("dinoList"),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn deleted_store_is_replaced_on_next_request() {
        let (_dir, provider) = temp_provider();
        let old = provider.value_store::<Dino>("dino").unwrap();
        old.put(dino("Rex", 4)).unwrap();
        old.delete().unwrap();
        assert!(!provider.contains("dino"));

        let fresh = provider.value_store::<Dino>("dino").unwrap();
        assert!(!fresh.is_deleted());
        assert!(matches!(
            fresh.get(),
            Err(StoreError::ItemNotFound { .. })
        ));
        fresh.put(dino("Blue", 2)).unwrap();

        assert!(matches!(old.get(), Err(StoreError::StoreDeleted)));
        assert_eq!(fresh.get().unwrap(), dino("Blue", 2));
    }

    #[test]
    fn deleted_key_may_change_type() {
        let (_dir, provider) = temp_provider();
        provider.value_store::<Dino>("dino").unwrap().delete().unwrap();
        let list = provider.list_store::<Dino>("dino").unwrap();
        assert!(list.get().unwrap().is_empty());
    }

    #[test]
    fn keys_lists_live_stores() {
        let (_dir, provider) = temp_provider();
        provider.value_store::<Dino>("b").unwrap();
        provider.list_store::<Dino>("a").unwrap();
        provider.value_store::<Dino>("c").unwrap().delete().unwrap();

        assert_eq!(provider.keys(), vec!["a".to_string(), "b".to_string()]);
        assert!(provider.contains("a"));
        assert!(!provider.contains("c"));
        assert!(!provider.contains("missing"));
    }

    #[test]
    fn stored_keys_recovers_escaped_keys() {
        let (_dir, provider) = temp_provider();
        provider
            .value_store::<Dino>("dino list/2")
            .unwrap()
            .put(dino("Rex", 4))
            .unwrap();
        provider
            .list_store::<Dino>("dinoList")
            .unwrap()
            .put(vec![dino("Blue", 2)])
            .unwrap();
        // Never written, so no file.
        provider.value_store::<Dino>("ghost").unwrap();
        std::fs::write(provider.root().join(".stowage-abc123.tmp"), b"partial").unwrap();

        assert_eq!(
            provider.stored_keys().unwrap(),
            vec!["dino list/2".to_string(), "dinoList".to_string()]
        );
    }

    #[test]
    fn invalid_key_is_rejected() {
        let (_dir, provider) = temp_provider();
        assert!(matches!(
            provider.value_store::<Dino>(""),
            Err(StoreError::Slot(_))
        ));
    }

    #[test]
    fn builder_creates_root_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("stores");
        let provider = StoreProvider::builder(&root)
            .using(JsonConverter::new())
            .unwrap();
        assert!(root.is_dir());
        assert_eq!(provider.root(), root.as_path());
    }

    #[test]
    fn from_config_uses_configured_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProviderConfig {
            root: dir.path().join("cfg"),
            pretty_json: true,
            ..ProviderConfig::default()
        };
        let provider = StoreProvider::from_config(&config).unwrap();
        assert!(provider.converter().is_pretty());

        let store = provider.value_store::<Dino>("dino").unwrap();
        store.put(dino("Rex", 4)).unwrap();
        assert!(dir.path().join("cfg").join("dino").is_file());
    }

    #[test]
    fn bincode_provider_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StoreProvider::builder(dir.path())
            .scheduling_with(IoScheduler::Inline)
            .using(BincodeConverter)
            .unwrap();
        let list = provider.list_store::<Dino>("dinoList").unwrap();
        list.put(vec![dino("Rex", 4), dino("Blue", 2)]).unwrap();
        list.remove_at(0).unwrap();
        assert_eq!(list.get().unwrap(), vec![dino("Blue", 2)]);

        let reopened = StoreProvider::builder(dir.path())
            .using(BincodeConverter)
            .unwrap();
        assert_eq!(
            reopened.list_store::<Dino>("dinoList").unwrap().get().unwrap(),
            vec![dino("Blue", 2)]
        );
    }

    #[test]
    fn concurrent_requests_share_one_store() {
        use std::thread;

        let (_dir, provider) = temp_provider();
        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let provider = provider.clone();
                thread::spawn(move || {
                    provider
                        .list_store::<Dino>("dinoList")
                        .unwrap()
                        .add_to_list(dino("d", i))
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        let list = provider.list_store::<Dino>("dinoList").unwrap();
        let mut lengths: Vec<u32> = list.get().unwrap().iter().map(|d| d.arm_length).collect();
        lengths.sort();
        assert_eq!(lengths, (0..8).collect::<Vec<_>>());
        assert_eq!(provider.keys(), vec!["dinoList".to_string()]);
    }

    #[test]
    fn registry_queries_do_not_wait_for_busy_stores() {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let (_dir, provider) = temp_provider();
        let list = provider.list_store::<Dino>("dinoList").unwrap();
        list.add_to_list(dino("Rex", 4)).unwrap();

        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let writer = thread::spawn(move || {
            list.remove_where(|_| {
                entered_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                false
            })
            .unwrap();
        });
        entered_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let reader = provider.clone();
        thread::spawn(move || {
            let keys = reader.keys();
            let contains = reader.contains("dinoList");
            let same = reader.list_store::<Dino>("dinoList").is_ok();
            done_tx.send((keys, contains, same)).unwrap();
        });
        let answer = done_rx.recv_timeout(Duration::from_secs(5));

        release_tx.send(()).unwrap();
        writer.join().expect("writer should not panic");

        let (keys, contains, same) = answer.expect("registry query blocked on a store lock");
        assert_eq!(keys, vec!["dinoList".to_string()]);
        assert!(contains);
        assert!(same);
    }

    #[test]
    fn debug_shows_root_and_count() {
        let (_dir, provider) = temp_provider();
        provider.value_store::<Dino>("dino").unwrap();
        let debug = format!("{provider:?}");
        assert!(debug.contains("store_count: 1"));
    }
}
