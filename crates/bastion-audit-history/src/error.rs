use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("invalid history key {0:?} (expected <hash> or <hash>@<timestamp_ms>)")]
    InvalidKey(String),
    #[error("no history entry matches {0:?}")]
    NotFound(String),
}
