use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
