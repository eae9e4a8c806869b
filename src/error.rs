use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(String),
    #[error("no saved calculation with id {0}")]
    NotFound(String),
    #[error("unsupported currency code: {0}")]
    UnknownCurrency(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("calculation history lock was poisoned")]
    LockPoisoned,
    #[error("background storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
