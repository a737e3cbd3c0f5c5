use core_types::StoreError;
use tax::TaxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Ledger unavailable: {0}")]
    Ledger(#[from] StoreError),

    #[error(transparent)]
    Tax(#[from] TaxError),
}
