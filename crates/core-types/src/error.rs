use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}

/// Failure reported by an injected storage capability.
///
/// Every store trait in the workspace returns this type so that the crates
/// consuming storage do not need to know which backend sits behind it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("The requested record was not found.")]
    NotFound,

    #[error("Storage backend failure: {0}")]
    Backend(String),
}
