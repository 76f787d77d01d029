//! Error types and per-file load outcomes.

use std::path::PathBuf;

/// Errors raised while loading, storing or writing rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rule text that does not deserialize. `origin` is the file path, or
    /// `"inline"` for pasted text.
    #[error("invalid rule definition in {origin}: {message}")]
    InvalidRuleDefinition { origin: String, message: String },

    /// Store-level problem: duplicate or unknown id, illegal edit.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("failed to serialize rule: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Outcome of loading a single rule file.
#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug)]
pub enum LoadStatus {
    /// Every rule in the file was parsed; ids in file order.
    Loaded { rule_ids: Vec<String> },
    /// Not a rule file (dotfile, other extension).
    Skipped { reason: String },
    Failed { error: String },
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded { .. })
    }
}
