//! JSON file persistence — human-readable documents, git-friendly.
//! A missing file reads as an empty document; saves go through a temp file
//! and rename so a crash never leaves a partial document on disk.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use fetebot_core::error::{FetebotError, Result};

/// File-backed document store; one JSON file per document.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Create a store rooted at the given directory.
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self {
            path: dir.to_path_buf(),
        }
    }

    /// Default store path (~/.fetebot/data).
    pub fn default_path() -> PathBuf {
        fetebot_core::FetebotConfig::home_dir().join("data")
    }

    /// Load a document. A missing or unreadable file yields the empty
    /// document rather than an error.
    pub fn load<T: DeserializeOwned + Default>(&self, file_name: &str) -> T {
        let file = self.path.join(file_name);
        if !file.exists() {
            return T::default();
        }
        match std::fs::read_to_string(&file) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Failed to parse {}: {e}", file.display());
                T::default()
            }),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read {}: {e}", file.display());
                T::default()
            }
        }
    }

    /// Save a document, overwriting atomically.
    pub fn save<T: Serialize>(&self, file_name: &str, document: &T) -> Result<()> {
        let file = self.path.join(file_name);
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| FetebotError::Storage(format!("Serialize error: {e}")))?;
        let tmp = file.with_extension("tmp");
        std::fs::write(&tmp, &json)
            .map_err(|e| FetebotError::Storage(format!("Write error: {e}")))?;
        std::fs::rename(&tmp, &file)
            .map_err(|e| FetebotError::Storage(format!("Rename error: {e}")))?;
        tracing::debug!("💾 Saved {} ({} bytes)", file.display(), json.len());
        Ok(())
    }
}
