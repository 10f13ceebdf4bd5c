use startuptimes_core::RecordError;
use thiserror::Error;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The Props table exists but does not carry the expected version record.
    #[error("schema version mismatch: expected {expected}, found {found}")]
    Schema {
        expected: String,
        found: String,
    },
    #[error(transparent)]
    MalformedRecord(#[from] RecordError),
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),
}
