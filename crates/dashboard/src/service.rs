use crate::error::DashboardError;
use crate::source::LedgerSource;
use analytics::{
    aggregate_monthly, category_breakdown, health_breakdown, ledger_totals, taxable_income,
    CategoryShare, ForecastResult, Forecaster, HealthBreakdown, LedgerTotals, MonthlySeries,
    DEFAULT_WINDOW_MONTHS, INSUFFICIENT_DATA_SCORE,
};
use chrono::NaiveDate;
use core_types::{TaxRecord, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tax::TaxCalculator;

/// Everything the dashboard shows for one user on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub user_id: UserId,
    pub as_of: NaiveDate,
    pub totals: LedgerTotals,
    pub time_series: MonthlySeries,
    /// `None` until the series is long enough to forecast.
    pub forecast: Option<ForecastResult>,
    /// Sum of `payable` over unpaid tax records.
    pub tax_due: Decimal,
    pub health_score: u8,
    pub health: Option<HealthBreakdown>,
}

pub struct DashboardService {
    ledger: Arc<dyn LedgerSource>,
    tax: TaxCalculator,
    forecaster: Forecaster,
    window: usize,
}

impl DashboardService {
    pub fn new(ledger: Arc<dyn LedgerSource>, tax: TaxCalculator, forecaster: Forecaster) -> Self {
        Self {
            ledger,
            tax,
            forecaster,
            window: DEFAULT_WINDOW_MONTHS,
        }
    }

    /// Overrides the trailing window length. A zero window is treated as one month.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn tax(&self) -> &TaxCalculator {
        &self.tax
    }

    pub async fn summary(
        &self,
        user_id: UserId,
        as_of: NaiveDate,
    ) -> Result<DashboardSummary, DashboardError> {
        let transactions = self.ledger.get_transactions(user_id).await?;
        let totals = ledger_totals(&transactions);
        let time_series = aggregate_monthly(&transactions, self.window, as_of);
        let forecast = self
            .forecaster
            .forecast_for_user(user_id, time_series.points());

        let tax_due = self.tax.outstanding(user_id).await?;
        let health = health_breakdown(&time_series.income(), &time_series.expense(), tax_due);
        let health_score = health.map(|h| h.score).unwrap_or(INSUFFICIENT_DATA_SCORE);

        tracing::debug!(
            user_id,
            transactions = transactions.len(),
            forecast = forecast.is_some(),
            health_score,
            "Built dashboard summary."
        );

        Ok(DashboardSummary {
            user_id,
            as_of,
            totals,
            time_series,
            forecast,
            tax_due,
            health_score,
            health,
        })
    }

    pub async fn category_breakdown(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CategoryShare>, DashboardError> {
        let transactions = self.ledger.get_transactions(user_id).await?;
        Ok(category_breakdown(&transactions))
    }

    /// Derives the month's taxable income from the ledger and records the liability.
    ///
    /// Like [`TaxCalculator::compute_tax`], every call adds a new record.
    pub async fn generate_tax(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<TaxRecord, DashboardError> {
        let transactions = self.ledger.get_transactions(user_id).await?;
        let taxable = taxable_income(&transactions, year, month);
        Ok(self.tax.compute_tax(user_id, year, month, taxable).await?)
    }
}
