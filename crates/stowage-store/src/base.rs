//! State shared by value and list stores: the slot, the converter and the
//! lifecycle lock.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use stowage_convert::{Converter, TypeTag};
use stowage_slot::FileSlot;

use crate::error::{StoreError, StoreResult};

/// Lifecycle of a store. `Deleted` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Active,
    Deleted,
}

/// The part of a store that does not depend on the item type.
///
/// The lifecycle mutex doubles as the store's exclusive-access lock: every
/// operation holds it from the deleted check through read, write and event
/// emission, so mutations on one store never interleave.
///
/// `deleted` mirrors the lifecycle for lock-free reads. It is only set
/// while the mutex is held.
pub(crate) struct StoreCore<C> {
    key: String,
    slot: FileSlot,
    converter: Arc<C>,
    state: Mutex<Lifecycle>,
    deleted: AtomicBool,
}

impl<C> StoreCore<C> {
    pub(crate) fn new(key: String, slot: FileSlot, converter: Arc<C>) -> Self {
        Self {
            key,
            slot,
            converter,
            state: Mutex::new(Lifecycle::Active),
            deleted: AtomicBool::new(false),
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn path(&self) -> &Path {
        self.slot.path()
    }

    /// Never blocks, even while another thread holds the store lock.
    pub(crate) fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    // The slot is replaced atomically and the lifecycle only changes in
    // `delete`, so a panic inside the lock leaves nothing half-done.
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` with exclusive access, failing fast if the store is deleted.
    pub(crate) fn exclusive<R>(&self, op: impl FnOnce(&Self) -> StoreResult<R>) -> StoreResult<R> {
        let state = self.lock();
        if *state == Lifecycle::Deleted {
            return Err(StoreError::StoreDeleted);
        }
        let result = op(self);
        drop(state);
        result
    }

    /// Remove the backing file and mark the store deleted.
    ///
    /// `on_deleted` runs under the lock after the state flips, so the
    /// terminal event is ordered after every earlier mutation and before
    /// any later operation fails.
    pub(crate) fn delete(&self, on_deleted: impl FnOnce()) -> StoreResult<()> {
        let mut state = self.lock();
        if *state == Lifecycle::Deleted {
            return Err(StoreError::StoreDeleted);
        }
        self.slot.delete()?;
        *state = Lifecycle::Deleted;
        self.deleted.store(true, Ordering::Release);
        on_deleted();
        info!(key = %self.key, "store deleted");
        Ok(())
    }
}

impl<C: Converter> StoreCore<C> {
    /// Decode the slot content, `None` if the slot is missing or empty.
    pub(crate) fn read<T: DeserializeOwned>(&self, tag: &TypeTag) -> StoreResult<Option<T>> {
        match self.slot.read()? {
            Some(bytes) => Ok(Some(self.converter.deserialize(&bytes, tag)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn write<T: Serialize + ?Sized>(&self, value: &T, tag: &TypeTag) -> StoreResult<()> {
        let bytes = self.converter.serialize(value, tag)?;
        self.slot.write(&bytes)?;
        Ok(())
    }

    pub(crate) fn clear(&self) -> StoreResult<()> {
        self.slot.clear()?;
        Ok(())
    }
}
