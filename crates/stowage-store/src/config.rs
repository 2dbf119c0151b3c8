use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use stowage_slot::SyncMode;

use crate::error::{StoreError, StoreResult};

/// Settings for a [`StoreProvider`](crate::StoreProvider).
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes:
///
/// ```toml
/// root = "/var/lib/myapp/stores"
/// sync_mode = "every_write"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Directory holding one file per store key.
    pub root: PathBuf,
    /// Flush strategy for slot writes.
    pub sync_mode: SyncMode,
    /// Indent JSON output when the provider uses the JSON converter.
    pub pretty_json: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("stowage"),
            sync_mode: SyncMode::default(),
            pretty_json: false,
        }
    }
}

impl ProviderConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> StoreResult<Self> {
        toml::from_str(source).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ProviderConfig::default();
        assert_eq!(c.root, PathBuf::from("stowage"));
        assert_eq!(c.sync_mode, SyncMode::OsDefault);
        assert!(!c.pretty_json);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ProviderConfig::from_toml_str(
            r#"
            root = "/tmp/stores"
            sync_mode = "every_write"
            "#,
        )
        .unwrap();
        assert_eq!(c.root, PathBuf::from("/tmp/stores"));
        assert_eq!(c.sync_mode, SyncMode::EveryWrite);
        assert!(!c.pretty_json);
    }

    #[test]
    fn reject_unknown_keys() {
        let err = ProviderConfig::from_toml_str("channel_capacity = 8").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn reject_unknown_sync_mode() {
        let err = ProviderConfig::from_toml_str(r#"sync_mode = "sometimes""#).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stowage.toml");
        std::fs::write(&path, "pretty_json = true\nroot = \"cfg\"\n").unwrap();
        let c = ProviderConfig::load(&path).unwrap();
        assert!(c.pretty_json);
        assert_eq!(c.root, PathBuf::from("cfg"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProviderConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
