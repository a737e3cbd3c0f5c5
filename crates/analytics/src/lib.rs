//! # BizPilot Analytics
//!
//! Pure computations over a user's ledger: the trailing monthly series, a short
//! trend forecast and the business health score.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O and no async. Every function takes caller-supplied data
//!   and returns a value; "not enough data" is an ordinary return value, never an error.
//! - **Decimal arithmetic:** all money and derived ratios use `rust_decimal::Decimal`.
//! - **Optional state:** the only shared state is the best-effort [`ModelCache`]
//!   a [`Forecaster`] may be given; results never depend on it.
//!
//! ## Public API
//!
//! - [`aggregate_monthly`] and friends: ledger → [`MonthlySeries`], totals, breakdowns.
//! - [`Forecaster`] / [`forecast`]: three-month projection with a confidence heuristic.
//! - [`health_score`] / [`health_breakdown`]: the weighted 0–100 score.

pub mod cache;
pub mod forecast;
pub mod health;
pub mod ledger;
pub mod stats;

pub use cache::{BoundedModelCache, ModelCache};
pub use forecast::{
    forecast, ForecastResult, Forecaster, Prediction, TrendModel, DEFAULT_MIN_POINTS,
    FORECAST_HORIZON,
};
pub use health::{health_breakdown, health_score, HealthBreakdown, INSUFFICIENT_DATA_SCORE};
pub use ledger::{
    aggregate_monthly, aggregate_trailing, category_breakdown, ledger_totals, taxable_income,
    CategoryShare, LedgerTotals, MonthlySeries, DEFAULT_WINDOW_MONTHS,
};
pub use stats::TrendLine;
