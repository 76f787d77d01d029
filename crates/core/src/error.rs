use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid config value for {key}: {message}")]
    Config { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
