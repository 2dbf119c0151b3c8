use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SlotError, SlotResult};
use crate::names::slot_file_name;

/// Prefix shared by in-flight temporary files. Never produced by
/// [`slot_file_name`], so temporaries cannot be mistaken for slots.
const TEMP_PREFIX: &str = ".stowage-";
const TEMP_SUFFIX: &str = ".tmp";

/// Flush strategy for slot writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` the temporary file before renaming it into place.
    EveryWrite,
    /// Rely on OS page-cache buffering.
    OsDefault,
}

impl Default for SyncMode {
    fn default() -> Self {
        Self::OsDefault
    }
}

/// One durable storage unit: a single file that is replaced atomically.
#[derive(Clone, Debug)]
pub struct FileSlot {
    path: PathBuf,
    sync_mode: SyncMode,
}

impl FileSlot {
    /// Slot for `key` inside `dir`. The file is not created until the first
    /// write.
    pub fn for_key(dir: &Path, key: &str, sync_mode: SyncMode) -> SlotResult<Self> {
        let name = slot_file_name(key)?;
        Ok(Self::at(dir.join(name), sync_mode))
    }

    /// Slot at an explicit path.
    pub fn at(path: PathBuf, sync_mode: SyncMode) -> Self {
        Self { path, sync_mode }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// Returns `true` if the backing file exists (it may be empty).
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Current content, or `None` if the file is missing or zero-length.
    pub fn read(&self) -> SlotResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the slot content with `bytes`.
    ///
    /// The data is written to a temporary file next to the target and then
    /// renamed over it. On failure the previous content is left intact.
    pub fn write(&self, bytes: &[u8]) -> SlotResult<()> {
        let dir = self.parent();
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        if matches!(self.sync_mode, SyncMode::EveryWrite) {
            tmp.as_file().sync_all()?;
        }

        tmp.persist(&self.path).map_err(|e| {
            warn!(path = %self.path.display(), error = %e.error, "atomic rename failed");
            SlotError::Persist {
                path: self.path.clone(),
                source: e.error,
            }
        })?;

        debug!(path = %self.path.display(), len = bytes.len(), "slot written");
        Ok(())
    }

    /// Write the empty representation (zero bytes).
    pub fn clear(&self) -> SlotResult<()> {
        self.write(&[])
    }

    /// Remove the backing file. Returns `true` if it existed.
    pub fn delete(&self) -> SlotResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "slot deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn parent(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

/// Returns `true` if `name` looks like a leftover temporary file.
pub fn is_temp_file_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}
