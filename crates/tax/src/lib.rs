//! # BizPilot Tax
//!
//! Computes monthly VAT and tax liabilities and records them with a due date.
//!
//! Rates resolve per `(user, year)` from an optional [`core_types::TaxConfig`],
//! falling back to configured defaults. Persistence is reached only through the
//! injected [`TaxStore`] capability.

pub mod calculator;
pub mod error;
pub mod store;

pub use calculator::{
    assess, due_date_for, TaxAssessment, TaxCalculator, DUE_DAY_OF_MONTH, FALLBACK_DUE_DAYS,
};
pub use error::TaxError;
pub use store::TaxStore;
