//! Shortcuts file — JSON map from combination string to action.
//!
//! ```json
//! {
//!     "ctrl+alt+t": {
//!         "type": "type_text",
//!         "value": "hello"
//!     }
//! }
//! ```
//!
//! Written with 4-space indentation and unescaped UTF-8. Entry order is
//! preserved across load/save.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::action::ActionDescriptor;

/// Ordered combination → action map, as stored on disk.
pub type Entries = IndexMap<String, ActionDescriptor>;

/// Shortcuts file error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed store for registry entries.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries. A missing file is an empty map.
    pub fn load(&self) -> Result<Entries, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => return Err(self.io_error(source)),
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Write all entries, replacing the file atomically.
    pub fn save(&self, entries: &Entries) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let bytes = encode(entries).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.sibling(".tmp");

        fs::write(&tmp, &bytes).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    /// Copy the current file to `<path>.bak`, replacing any older backup.
    ///
    /// `Ok(None)` if there is no file to keep.
    pub fn back_up(&self) -> Result<Option<PathBuf>, ConfigError> {
        let backup = self.sibling(".bak");
        match fs::copy(&self.path, &backup) {
            Ok(_) => Ok(Some(backup)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(suffix);
        PathBuf::from(path)
    }

    fn io_error(&self, source: io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Serialize entries in the on-disk layout.
pub fn encode(entries: &Entries) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries.serialize(&mut ser)?;
    Ok(buf)
}
