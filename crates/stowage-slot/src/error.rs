use std::io;
use std::path::PathBuf;

/// Errors from durable file slot operations.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    /// I/O error while reading, writing or removing the slot file.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The temporary file could not be moved over the target.
    ///
    /// The target keeps its previous content. A stale temporary file may
    /// remain in the directory.
    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The key cannot be mapped to a file name.
    #[error("invalid store key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
}

/// Convenience alias used throughout the slot crate.
pub type SlotResult<T> = std::result::Result<T, SlotError>;
