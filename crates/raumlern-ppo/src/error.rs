use raumlern_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PpoError {
    #[error("Snapshot deserialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Environment error: {0}")]
    Env(#[from] CoreError),
    #[error("Shape mismatch: {0}")]
    Shape(String),
    #[error("Invalid training config: {0}")]
    InvalidConfig(String),
    #[error("Model record failed: {0}")]
    Record(String),
    #[error("Model I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PpoError>;
