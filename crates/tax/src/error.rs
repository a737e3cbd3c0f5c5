use core_types::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TaxError {
    #[error("Tax storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("No tax record for user {user_id} in {year}-{month:02}.")]
    RecordNotFound { user_id: i64, year: i32, month: u32 },

    #[error("Tax record {0} does not exist for this user.")]
    UnknownRecord(Uuid),

    #[error("Invalid tax rate: {0}")]
    InvalidRate(String),
}
