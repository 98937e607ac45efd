use thiserror::Error;

#[derive(Error, Debug)]
pub enum CareerGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid quiz input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External source error: {0}")]
    Source(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),
}

pub type Result<T> = std::result::Result<T, CareerGraphError>;
