use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("database connection poisoned")]
    ConnectionPoisoned,
    #[error("invalid record for {id}: {reason}")]
    InvalidRecord { id: String, reason: String },
    #[error("config store unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}
