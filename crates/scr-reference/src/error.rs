use scr_core::ScoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid reference population: {0}")]
    Population(#[from] ScoreError),
}
