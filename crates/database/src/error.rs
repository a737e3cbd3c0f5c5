use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to read or write the snapshot file: {0}")]
    Io(#[from] std::io::Error),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Snapshot is inconsistent: {0}")]
    InvalidSnapshot(String),
}
