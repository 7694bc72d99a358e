pub mod merge;

pub use merge::{merge, MergeLedger, MergeResult};

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use codeharvest_common::{CodeRecord, HarvestError};

/// The persisted record set: one JSON array, rewritten whole on every save.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the store. A missing file is an empty store; an unreadable or
    /// corrupt one is an error.
    pub fn load_strict(&self) -> Result<Vec<CodeRecord>, HarvestError> {
        let read_err = |reason: String| HarvestError::PersistenceRead {
            path: self.path.clone(),
            reason,
        };

        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_err(e.to_string())),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| read_err(e.to_string()))
    }

    /// Read the store, degrading to empty when it cannot be read.
    pub fn load(&self) -> Vec<CodeRecord> {
        match self.load_strict() {
            Ok(records) => {
                info!(path = %self.path.display(), records = records.len(), "Store loaded");
                records
            }
            Err(e) => {
                warn!(error = %e, "Store unreadable, starting from an empty store");
                Vec::new()
            }
        }
    }

    /// Replace the store with `records`. Written to a temp file in the same
    /// directory and renamed over the old one.
    pub fn save(&self, records: &[CodeRecord]) -> Result<(), HarvestError> {
        let write_err = |reason: String| HarvestError::PersistenceWrite {
            path: self.path.clone(),
            reason,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| write_err(e.to_string()))?;

        let json = serde_json::to_string_pretty(records).map_err(|e| write_err(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| write_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .map_err(|e| write_err(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| write_err(e.error.to_string()))?;

        info!(path = %self.path.display(), records = records.len(), "Store saved");
        Ok(())
    }
}
