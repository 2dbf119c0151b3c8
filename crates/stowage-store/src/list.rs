use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use stowage_convert::{Converter, JsonConverter, TypeTag};
use stowage_slot::FileSlot;

use crate::base::StoreCore;
use crate::error::{StoreError, StoreResult};
use crate::event::ListStoreEvent;
use crate::schedule::IoScheduler;
use crate::stream::{EventChannel, EventStream};
use crate::traits::StoreItem;

/// Builds the event for a finished list mutation from the resulting list.
type EventFn<T> = fn(Vec<T>) -> ListStoreEvent<T>;

struct ListInner<T, C> {
    core: StoreCore<C>,
    events: EventChannel<ListStoreEvent<T>>,
    scheduler: IoScheduler,
    tag: TypeTag,
}

/// A store holding an ordered list of `T`.
///
/// An absent or cleared file reads as an empty list. Every mutation reads
/// the current list, applies the change and writes the result back while
/// holding the store lock, then publishes one event carrying the resulting
/// list.
///
/// Obtain one from [`StoreProvider::list_store`].
///
/// [`StoreProvider::list_store`]: crate::StoreProvider::list_store
pub struct ListStore<T, C = JsonConverter> {
    inner: Arc<ListInner<T, C>>,
}

impl<T, C> Clone for ListStore<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: StoreItem, C: Converter> ListStore<T, C> {
    pub(crate) fn new(
        key: String,
        slot: FileSlot,
        converter: Arc<C>,
        scheduler: IoScheduler,
    ) -> Self {
        let events = EventChannel::new(&key);
        Self {
            inner: Arc::new(ListInner {
                core: StoreCore::new(key, slot, converter),
                events,
                scheduler,
                tag: TypeTag::list_of::<T>(),
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
    pub fn events(&self) -> EventStream<ListStoreEvent<T>> {
        self.inner.events.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.events.subscriber_count()
    }

    /// Read the list. Never fails for an absent file.
    pub fn get(&self) -> StoreResult<Vec<T>> {
        let inner = &self.inner;
        inner
            .core
            .exclusive(|core| Ok(core.read(&inner.tag)?.unwrap_or_default()))
    }

    /// Replace the whole list.
    pub fn put(&self, list: Vec<T>) -> StoreResult<Vec<T>> {
        let inner = &self.inner;
        inner.core.exclusive(|core| {
            core.write(&list, &inner.tag)?;
            inner.events.emit(ListStoreEvent::ListPut(list.clone()));
            debug!(key = %core.key(), len = list.len(), "list put");
            Ok(list)
        })
    }

    /// Append `item` to the end of the list.
    pub fn add_to_list(&self, item: T) -> StoreResult<Vec<T>> {
        self.modify(move |list| {
            list.push(item);
            Ok(ListStoreEvent::ItemAdded as EventFn<T>)
        })
    }

    /// Remove the first element equal to `item`.
    ///
    /// A miss is not an error: the list is rewritten unchanged and the
    /// event still fires.
    pub fn remove_from_list(&self, item: &T) -> StoreResult<Vec<T>>
    where
        T: PartialEq,
    {
        self.modify(|list| {
            if let Some(pos) = list.iter().position(|x| x == item) {
                list.remove(pos);
            }
            Ok(ListStoreEvent::ItemRemoved as EventFn<T>)
        })
    }

    /// Remove the element at `index`.
    ///
    /// Fails with [`StoreError::IndexOutOfRange`] if `index >= len`; the
    /// list is left untouched and no event fires.
    pub fn remove_at(&self, index: usize) -> StoreResult<Vec<T>> {
        self.modify(|list| {
            if index >= list.len() {
                return Err(StoreError::IndexOutOfRange {
                    index,
                    len: list.len(),
                });
            }
            list.remove(index);
            Ok(ListStoreEvent::ItemRemoved as EventFn<T>)
        })
    }

    /// Remove every element for which `predicate` returns `true`, keeping
    /// the survivors in order. Zero matches is not an error.
    pub fn remove_where<P>(&self, mut predicate: P) -> StoreResult<Vec<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.modify(|list| {
            list.retain(|x| !predicate(x));
            Ok(ListStoreEvent::ItemRemoved as EventFn<T>)
        })
    }

    /// Replace the first element matching `predicate` with `item`, in place.
    /// Without a match the list is unchanged and the event still fires.
    pub fn replace<P>(&self, item: T, predicate: P) -> StoreResult<Vec<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.modify(move |list| {
            if let Some(pos) = list.iter().position(predicate) {
                list[pos] = item;
            }
            Ok(ListStoreEvent::ItemReplaced as EventFn<T>)
        })
    }

    /// Replace the first element matching `predicate`, or append `item` if
    /// none matches.
    pub fn add_or_replace<P>(&self, item: T, predicate: P) -> StoreResult<Vec<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.modify(move |list| {
            let found = list.iter().position(predicate);
            match found {
                Some(pos) => {
                    list[pos] = item;
                    Ok(ListStoreEvent::ItemReplaced as EventFn<T>)
                }
                None => {
                    list.push(item);
                    Ok(ListStoreEvent::ItemAdded as EventFn<T>)
                }
            }
        })
    }

    /// Empty the list and publish [`ListStoreEvent::Cleared`].
    pub fn clear(&self) -> StoreResult<()> {
        let inner = &self.inner;
        inner.core.exclusive(|core| {
            core.clear()?;
            inner.events.emit(ListStoreEvent::Cleared);
            debug!(key = %core.key(), "list cleared");
            Ok(())
        })
    }

    /// Delete the backing file, publish [`ListStoreEvent::Deleted`] and
    /// complete the event stream. The store is unusable afterwards.
    pub fn delete(&self) -> StoreResult<()> {
        let events = &self.inner.events;
        self.inner
            .core
            .delete(|| events.close_with(ListStoreEvent::Deleted))
    }

    /// Read-modify-write under the store lock.
    fn modify<F>(&self, op: F) -> StoreResult<Vec<T>>
    where
        F: FnOnce(&mut Vec<T>) -> StoreResult<EventFn<T>>,
    {
        let inner = &self.inner;
        inner.core.exclusive(|core| {
            let mut list: Vec<T> = core.read(&inner.tag)?.unwrap_or_default();
            let make_event = op(&mut list)?;
            core.write(&list, &inner.tag)?;
            let event = make_event(list.clone());
            debug!(key = %core.key(), kind = %event.kind(), len = list.len(), "list updated");
            inner.events.emit(event);
            Ok(list)
        })
    }

    /// [`ListStore::get`] on the I/O scheduler.
    pub async fn observe_get(&self) -> StoreResult<Vec<T>> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.get()).await
    }

    /// [`ListStore::put`] on the I/O scheduler.
    pub async fn observe_put(&self, list: Vec<T>) -> StoreResult<Vec<T>> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.put(list)).await
    }

    /// [`ListStore::add_to_list`] on the I/O scheduler.
    pub async fn observe_add_to_list(&self, item: T) -> StoreResult<Vec<T>> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.add_to_list(item)).await
    }

    /// [`ListStore::remove_from_list`] on the I/O scheduler.
    pub async fn observe_remove_from_list(&self, item: T) -> StoreResult<Vec<T>>
    where
        T: PartialEq,
    {
        let store = self.clone();
        self.inner
            .scheduler
            .run(move || store.remove_from_list(&item))
            .await
    }

    /// [`ListStore::remove_at`] on the I/O scheduler.
    pub async fn observe_remove_at(&self, index: usize) -> StoreResult<Vec<T>> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.remove_at(index)).await
    }

    /// [`ListStore::remove_where`] on the I/O scheduler.
    pub async fn observe_remove_where<P>(&self, predicate: P) -> StoreResult<Vec<T>>
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        let store = self.clone();
        self.inner
            .scheduler
            .run(move || store.remove_where(predicate))
            .await
    }

    /// [`ListStore::replace`] on the I/O scheduler.
    pub async fn observe_replace<P>(&self, item: T, predicate: P) -> StoreResult<Vec<T>>
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        let store = self.clone();
        self.inner
            .scheduler
            .run(move || store.replace(item, predicate))
            .await
    }

    /// [`ListStore::add_or_replace`] on the I/O scheduler.
    pub async fn observe_add_or_replace<P>(&self, item: T, predicate: P) -> StoreResult<Vec<T>>
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        let store = self.clone();
        self.inner
            .scheduler
            .run(move || store.add_or_replace(item, predicate))
            .await
    }

    /// [`ListStore::clear`] on the I/O scheduler.
    pub async fn observe_clear(&self) -> StoreResult<()> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.clear()).await
    }

    /// [`ListStore::delete`] on the I/O scheduler.
    pub async fn observe_delete(&self) -> StoreResult<()> {
        let store = self.clone();
        self.inner.scheduler.run(move || store.delete()).await
    }
}

impl<T, C> std::fmt::Debug for ListStore<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListStore")
            .field("key", &self.inner.core.key())
            .field("tag", &self.inner.tag)
            .finish()
    }
}
