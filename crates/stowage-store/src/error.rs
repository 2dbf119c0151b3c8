use std::io;

use stowage_convert::ConvertError;
use stowage_slot::SlotError;

/// Errors from store and provider operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A value store was read while holding no value.
    #[error("no item stored under key {key:?}")]
    ItemNotFound { key: String },

    /// A list index was outside `[0, len)`.
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The store was deleted; it accepts no further operations.
    #[error("This store has been deleted!")]
    StoreDeleted,

    /// The converter failed to encode or decode the stored data.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConvertError),

    /// Filesystem failure while reading, writing or removing a store file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Slot failure other than plain I/O (rename failure, bad key).
    #[error("slot error: {0}")]
    Slot(SlotError),

    /// The key is already registered with a different store kind or type.
    #[error("store {key:?} is registered as {found}, requested {expected}")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A background I/O job failed to complete.
    #[error("background task failed: {0}")]
    Worker(String),
}

impl From<SlotError> for StoreError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::Io(e) => Self::Io(e),
            other => Self::Slot(other),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
