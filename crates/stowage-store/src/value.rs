use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use stowage_convert::{Converter, JsonConverter, TypeTag};
use stowage_slot::FileSlot;

use crate::base::StoreCore;
use crate::error::{StoreError, StoreResult};
use crate::event::ValueStoreEvent;
use crate::schedule::IoScheduler;
use crate::stream::{EventChannel, EventStream};
use crate::traits::StoreItem;

struct ValueInner<T, C> {
    core: StoreCore<C>,
    events: EventChannel<ValueStoreEvent<T>>,
    scheduler: IoScheduler,
    tag: TypeTag,
}

/// A store holding a single value of type `T`, or nothing.
///
/// Handles are cheap to clone; clones share the same file, lock and event
/// channel. Obtain one from [`StoreProvider::value_store`].
///
/// [`StoreProvider::value_store`]: crate::StoreProvider::value_store
pub struct ValueStore<T, C = JsonConverter> {
    inner: Arc<ValueInner<T, C>>,
}

impl<T, C> Clone for ValueStore<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: StoreItem, C: Converter> ValueStore<T, C> {
    pub(crate) fn new(
        key: String,
        slot: FileSlot,
        converter: Arc<C>,
        scheduler: IoScheduler,
    ) -> Self {
        let events = EventChannel::new(&key);
        Self {
            inner: Arc::new(ValueInner {
                core: StoreCore::new(key, slot, converter),
                events,
                scheduler,
                tag: TypeTag::value::<T>(),
            }),
        }
    }

    pub fn key(&self) -> &str {
        self.inner.core.key()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        self.inner.core.path()
    }

    pub fn is_deleted(&self) -> bool {
        self.inner.core.is_deleted()
    }

    /// Subscribe to events emitted from now on.
    pub fn events(&self) -> EventStream<ValueStoreEvent<T>> {
        self.inner.events.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.events.subscriber_count()
    }

    /// Read the stored value.
    ///
    /// Fails with [`StoreError::ItemNotFound`] if nothing is stored.
    pub fn get(&self) -> StoreResult<T> {
        self.get_optional()?.ok_or_else(|| StoreError::ItemNotFound {
            key: self.key().to_string(),
        })
    }

    /// Read the stored value, `None` if nothing is stored.
    pub fn get_optional(&self) -> StoreResult<Option<T>> {
        let inner = &self.inner;
        inner.core.exclusive(|core| core.read(&inner.tag))
    }

    /// Replace the stored value and publish [`ValueStoreEvent::Put`].
    pub fn put(&self, value: T) -> StoreResult<T> {
        let inner = &self.inner;
        inner.core.exclusive(|core| {
            core.write(&value, &inner.tag)?;
            inner.events.emit(ValueStoreEvent::Put(value.clone()));
            debug!(key = %core.key(), "value put");
            Ok(value)
        })
    }

    /// Remove the stored value and publish [`ValueStoreEvent::Cleared`].
    pub fn clear(&self) -> StoreResult<()> {
        let inner = &self.inner;
        inner.core.exclusive(|core| {
            core.clear()?;
            inner.events.emit(ValueStoreEvent::Cleared);
            debug!(key = %core.key(), "value cleared");
            Ok(())
        })
    }

    /// Delete the backing file, publish [`ValueStoreEvent::Deleted`] and
    /// complete the event stream. The store is unusable afterwards.
    pub fn delete(&self) -> StoreResult<()> {
        let events = &self.inner.events;
        self.inner
            .core
            .delete(|| events.close_with(ValueStoreEvent::Deleted))
    }

    /// [`ValueStore::get`] on the I/O scheduler.
    pub async fn observe_get(&self) -> StoreResult<T> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.get()).await
    }

    /// [`ValueStore::put`] on the I/O scheduler.
    pub async fn observe_put(&self, value: T) -> StoreResult<T> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.put(value)).await
    }

    /// [`ValueStore::clear`] on the I/O scheduler.
    pub async fn observe_clear(&self) -> StoreResult<()> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.clear()).await
    }

    /// [`ValueStore::delete`] on the I/O scheduler.
    pub async fn observe_delete(&self) -> StoreResult<()> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.delete()).await
    }
}

impl<T, C> std::fmt::Debug for ValueStore<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueStore")
            .field("key", &self.inner.core.key())
            .field("tag", &self.inner.tag)
            .finish()
    }
}
