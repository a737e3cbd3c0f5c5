use core_types::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Reminder storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid reminder request: {0}")]
    InvalidRequest(String),
}
