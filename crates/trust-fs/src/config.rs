//! Format-agnostic configuration loading

use crate::{Error, NormalizedPath, Result};
use serde::de::DeserializeOwned;

/// Format-agnostic configuration store.
///
/// Detects the format from the file extension and deserializes
/// transparently.
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    /// Create a new ConfigStore.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let native_path = path.to_native();
        let extension = native_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if !matches!(extension.as_str(), "toml" | "json") {
            return Err(Error::UnsupportedFormat { extension });
        }

        let content =
            std::fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))?;

        if extension == "toml" {
            toml::from_str(&content).map_err(|e| Error::ConfigParse {
                path: native_path,
                format: "TOML".into(),
                message: e.to_string(),
            })
        } else {
            serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
                path: native_path,
                format: "JSON".into(),
                message: e.to_string(),
            })
        }
    }
}
