//! # BizPilot Core Types
//!
//! The shared data model of the workspace: ledger transactions, the derived monthly
//! series points, tax configuration and records, and reminders. As the bottom layer
//! it depends on no other workspace crate.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::TransactionKind;
pub use error::{CoreError, StoreError};
pub use structs::{
    MonthlyPoint, NewReminder, Reminder, TaxConfig, TaxRates, TaxRecord, Transaction, UserId,
};
