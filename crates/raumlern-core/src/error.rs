use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid room: {0}")]
    InvalidRoom(String),
    #[error("Invalid furniture catalog: {0}")]
    InvalidCatalog(String),
    #[error("Reward rule '{0}' has neither a default nor an override")]
    MissingRule(String),
    #[error("Episode is already over ({0:?})")]
    EpisodeOver(crate::env::EpisodeStatus),
    #[error("Reward config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Reward config serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Policy snapshot does not fit: {0}")]
    InvalidSnapshot(String),
    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
