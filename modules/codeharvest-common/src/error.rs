use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Error, Debug)]
pub enum HarvestError {
    /// One descriptor could not be fetched. Never fatal to a run.
    #[error("Source unavailable: {locator}: {reason}")]
    SourceUnavailable { locator: String, reason: String },

    /// The persisted store exists but could not be read or parsed.
    #[error("Failed to read store {path}: {reason}")]
    PersistenceRead { path: PathBuf, reason: String },

    /// The store could not be written. Fatal: the run's results are lost.
    #[error("Failed to write store {path}: {reason}")]
    PersistenceWrite { path: PathBuf, reason: String },

    #[error("Invalid extraction pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl HarvestError {
    /// Only persistence writes may abort a run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarvestError::PersistenceWrite { .. })
    }
}
