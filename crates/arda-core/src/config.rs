//! Converter configuration file

use crate::error::{Error, Result};
use crate::headers::HeaderMap;
use crate::images::TypeImageMap;
use crate::parser::RowPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for a conversion, stored as JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Canonical field name -> header label overrides
    pub headers: HeaderMap,
    /// Tool type -> image URL table and fallback image
    pub images: TypeImageMap,
    /// Handling of records whose column count drifts from the header
    pub row_policy: RowPolicy,
    /// Logic store holding the active mapping logic; the built-in mapping is used when unset
    pub logic_store: Option<PathBuf>,
}

impl ConverterConfig {
    /// Load a config file, or defaults if it does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Save the config as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Config with the built-in tool image catalog
    pub fn with_builtin_images() -> Self {
        Self {
            images: TypeImageMap::builtin(),
            ..Self::default()
        }
    }
}
