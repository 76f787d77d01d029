/// Errors from flag review and persistence.
#[derive(Debug, thiserror::Error)]
pub enum FlagError {
    /// No flag with this id; the store was left unchanged.
    #[error("unknown flag '{0}'")]
    UnknownFlag(String),

    #[error("unknown merge policy '{0}' (expected 'overwrite' or 'preserve-review')")]
    UnknownMergePolicy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize flags: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlagError>;
