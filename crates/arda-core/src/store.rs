//! Versioned storage of mapping logic source
//!
//! Every accepted update is kept as a new version so a bad edit can be rolled
//! back. Updates are compiled before they are stored; a source that fails to
//! compile never becomes active.

use crate::error::{Error, Result};
use crate::script::{compile, ScriptLogic, DEFAULT_LOGIC_SOURCE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// One saved version of the mapping logic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicEntry {
    /// Version number, starting at 1
    pub version: u32,
    /// When this version was saved
    pub saved_at: DateTime<Utc>,
    /// Mapping logic source
    pub source: String,
}

/// A named mapping logic with its version history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicStore {
    /// Name of the logic entry
    pub name: String,
    entries: Vec<LogicEntry>,
}

impl LogicStore {
    /// Create a store whose first version is the default logic
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: vec![LogicEntry {
                version: 1,
                saved_at: Utc::now(),
                source: DEFAULT_LOGIC_SOURCE.to_string(),
            }],
        }
    }

    /// Load a store from JSON, or create a default one if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new("default"));
        }

        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let store: Self = serde_json::from_str(&content).map_err(Error::Json)?;
        if store.entries.is_empty() {
            return Err(Error::Config(format!(
                "logic store {} has no versions",
                path.display()
            )));
        }
        Ok(store)
    }

    /// Save the store to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// The active (most recent) version
    pub fn active(&self) -> &LogicEntry {
        // new() and load() guarantee at least one entry, rollback() never removes the last
        &self.entries[self.entries.len() - 1]
    }

    pub fn active_version(&self) -> u32 {
        self.active().version
    }

    /// Compile the active version
    pub fn compile_active(&self) -> Result<ScriptLogic> {
        compile(&self.active().source)
    }

    /// All versions, oldest first
    pub fn history(&self) -> &[LogicEntry] {
        &self.entries
    }

    /// Validate and store a new version, returning its number
    ///
    /// On a syntax error the store is left unchanged.
    pub fn update(&mut self, source: impl Into<String>) -> Result<u32> {
        let source = source.into();
        compile(&source)?;

        let version = self.active_version() + 1;
        self.entries.push(LogicEntry {
            version,
            saved_at: Utc::now(),
            source,
        });
        info!(name = %self.name, version, "mapping logic updated");
        Ok(version)
    }

    /// Store the default logic as a new version
    pub fn reset_to_default(&mut self) -> Result<u32> {
        self.update(DEFAULT_LOGIC_SOURCE)
    }

    /// Drop the active version, reactivating the previous one
    ///
    /// Returns `None` when only one version remains.
    pub fn rollback(&mut self) -> Option<LogicEntry> {
        if self.entries.len() <= 1 {
            return None;
        }
        let dropped = self.entries.pop();
        if let Some(entry) = &dropped {
            info!(
                name = %self.name,
                dropped = entry.version,
                active = self.active_version(),
                "mapping logic rolled back"
            );
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM: &str = "\"Item Name\" = col(\"tool_description\")\n";

    #[test]
    fn test_new_store_starts_with_default_logic() {
        let store = LogicStore::new("fusion");

        assert_eq!(store.active_version(), 1);
        assert_eq!(store.active().source, DEFAULT_LOGIC_SOURCE);
        assert!(store.compile_active().is_ok());
    }

    #[test]
    fn test_update_adds_version() {
        let mut store = LogicStore::new("fusion");
        let version = store.update(CUSTOM).unwrap();

        assert_eq!(version, 2);
        assert_eq!(store.active().source, CUSTOM);
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_invalid_update_keeps_previous_logic() {
        let mut store = LogicStore::new("fusion");
        store.update(CUSTOM).unwrap();

        let err = store.update("\"Item Name\" = col(").unwrap_err();

        assert!(matches!(err, Error::LogicSyntax { .. }));
        assert_eq!(store.active_version(), 2);
        assert_eq!(store.active().source, CUSTOM);
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_rollback() {
        let mut store = LogicStore::new("fusion");
        store.update(CUSTOM).unwrap();

        let dropped = store.rollback().unwrap();
        assert_eq!(dropped.version, 2);
        assert_eq!(store.active_version(), 1);

        assert!(store.rollback().is_none());
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_reset_to_default() {
        let mut store = LogicStore::new("fusion");
        store.update(CUSTOM).unwrap();

        assert_eq!(store.reset_to_default().unwrap(), 3);
        assert_eq!(store.active().source, DEFAULT_LOGIC_SOURCE);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("arda-core-store-{}.json", std::process::id()));
        let mut store = LogicStore::new("fusion");
        store.update(CUSTOM).unwrap();

        store.save(&path).unwrap();
        let loaded = LogicStore::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_rejects_empty_history() {
        let path = std::env::temp_dir().join(format!("arda-core-empty-store-{}.json", std::process::id()));
        fs::write(&path, r#"{"name": "x", "entries": []}"#).unwrap();

        let err = LogicStore::load(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(matches!(err, Error::Config(_)));
    }
}
