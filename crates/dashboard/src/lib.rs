//! # BizPilot Dashboard
//!
//! Puts the ledger, analytics and tax crates together into the per-user views a
//! front end asks for.
//!
//! ## Public API
//!
//! - [`DashboardService::summary`]: totals, trailing series, forecast and health.
//! - [`DashboardService::category_breakdown`]
//! - [`DashboardService::generate_tax`]: taxable base from the ledger, then a new tax record.
//! - [`LedgerSource`]: the storage capability the service reads transactions through.

pub mod error;
pub mod service;
pub mod source;

pub use error::DashboardError;
pub use service::{DashboardService, DashboardSummary};
pub use source::LedgerSource;
