use crate::error::TaxError;
use crate::store::TaxStore;
use chrono::{Days, NaiveDate, Utc};
use core_types::{StoreError, TaxConfig, TaxRates, TaxRecord, UserId};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Day of the following month on which a period's tax falls due.
pub const DUE_DAY_OF_MONTH: u32 = 15;

/// Days after "today" used when the regular due date cannot be built.
pub const FALLBACK_DUE_DAYS: u64 = 30;

/// The money side of a tax computation, before it becomes a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAssessment {
    pub taxable_amount: Decimal,
    pub vat_amount: Decimal,
    pub tax_amount: Decimal,
    /// Taxable base plus VAT plus tax: the gross amount billed for the period.
    pub payable: Decimal,
}

fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Applies `rates` to a taxable base. Every amount is rounded to cents.
pub fn assess(taxable_amount: Decimal, rates: TaxRates) -> TaxAssessment {
    let vat_amount = cents(taxable_amount * rates.vat_rate);
    let tax_amount = cents(taxable_amount * rates.tax_rate);
    TaxAssessment {
        taxable_amount,
        vat_amount,
        tax_amount,
        payable: cents(taxable_amount + vat_amount + tax_amount),
    }
}

/// The 15th of the month after `(year, month)`, December rolling into January.
///
/// Falls back to `today + 30 days` if that date cannot be built: a month outside
/// `1..=12` or a year beyond the calendar's range.
pub fn due_date_for(year: i32, month: u32, today: NaiveDate) -> NaiveDate {
    let regular = match month {
        1..=11 => NaiveDate::from_ymd_opt(year, month + 1, DUE_DAY_OF_MONTH),
        12 => year
            .checked_add(1)
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, DUE_DAY_OF_MONTH)),
        _ => None,
    };

    regular.unwrap_or_else(|| {
        tracing::warn!(year, month, "Cannot build regular due date; using fallback.");
        today
            .checked_add_days(Days::new(FALLBACK_DUE_DAYS))
            .unwrap_or(today)
    })
}

/// Computes and records tax liabilities for user-months.
///
/// Rates come from the user's [`TaxConfig`] for the year when one exists, and
/// from `defaults` otherwise.
#[derive(Clone)]
pub struct TaxCalculator {
    store: Arc<dyn TaxStore>,
    defaults: TaxRates,
}

impl TaxCalculator {
    pub fn new(store: Arc<dyn TaxStore>, defaults: TaxRates) -> Self {
        Self { store, defaults }
    }

    /// The rates that apply to `(user_id, year)`.
    ///
    /// A missing override or a failing lookup both resolve to the defaults.
    pub async fn resolve_rates(&self, user_id: UserId, year: i32) -> TaxRates {
        match self.store.get_tax_config(user_id, year).await {
            Ok(Some(config)) => config.rates(),
            Ok(None) => self.defaults,
            Err(e) => {
                tracing::warn!(user_id, year, error = %e, "Tax config lookup failed; using default rates.");
                self.defaults
            }
        }
    }

    /// Computes the liability for one user-month and persists it as a new record.
    ///
    /// Each call creates a new record, even when one already exists for the same
    /// period, so callers must not retry it blindly.
    pub async fn compute_tax(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
        taxable_amount: Decimal,
    ) -> Result<TaxRecord, TaxError> {
        let rates = self.resolve_rates(user_id, year).await;
        let assessment = assess(taxable_amount, rates);
        let now = Utc::now();

        let record = TaxRecord {
            id: Uuid::new_v4(),
            user_id,
            year,
            month,
            taxable_amount: assessment.taxable_amount,
            vat_amount: assessment.vat_amount,
            tax_amount: assessment.tax_amount,
            payable: assessment.payable,
            due_date: due_date_for(year, month, now.date_naive()),
            paid: false,
            generated_at: now,
        };

        let stored = self.store.persist_tax_record(record).await?;
        tracing::info!(
            user_id,
            year,
            month,
            record_id = %stored.id,
            payable = %stored.payable,
            due_date = %stored.due_date,
            "Generated tax record."
        );
        Ok(stored)
    }

    /// Stores a rate override for a user and year.
    pub async fn set_config(&self, config: TaxConfig) -> Result<TaxConfig, TaxError> {
        if config.vat_rate.is_sign_negative() || config.tax_rate.is_sign_negative() {
            return Err(TaxError::InvalidRate(format!(
                "vat_rate={} tax_rate={}",
                config.vat_rate, config.tax_rate
            )));
        }
        Ok(self.store.save_tax_config(config).await?)
    }

    /// The record generated for a user-month.
    pub async fn record_for(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<TaxRecord, TaxError> {
        self.store
            .find_tax_record(user_id, year, month)
            .await?
            .ok_or(TaxError::RecordNotFound {
                user_id,
                year,
                month,
            })
    }

    /// Unpaid records falling due on or before `today + days`, earliest first.
    ///
    /// Overdue records are included.
    pub async fn due_within(
        &self,
        user_id: UserId,
        days: u64,
        today: NaiveDate,
    ) -> Result<Vec<TaxRecord>, TaxError> {
        let horizon = today
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX);
        let mut due: Vec<TaxRecord> = self
            .store
            .list_unpaid(user_id)
            .await?
            .into_iter()
            .filter(|r| r.due_date <= horizon)
            .collect();
        due.sort_by_key(|r| r.due_date);
        Ok(due)
    }

    /// Sum of `payable` over the user's unpaid records.
    pub async fn outstanding(&self, user_id: UserId) -> Result<Decimal, TaxError> {
        let unpaid = self.store.list_unpaid(user_id).await?;
        Ok(unpaid.iter().map(|r| r.payable).sum())
    }

    pub async fn mark_paid(&self, user_id: UserId, record_id: Uuid) -> Result<TaxRecord, TaxError> {
        match self.store.mark_paid(user_id, record_id).await {
            Ok(record) => {
                tracing::info!(user_id, record_id = %record_id, "Tax record marked paid.");
                Ok(record)
            }
            Err(StoreError::NotFound) => Err(TaxError::UnknownRecord(record_id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_rates_on_round_base() {
        let a = assess(dec!(100000), TaxRates::default());
        assert_eq!(a.vat_amount, dec!(15000.00));
        assert_eq!(a.tax_amount, dec!(0.00));
        assert_eq!(a.payable, dec!(115000.00));
    }

    #[test]
    fn amounts_round_to_cents() {
        let rates = TaxRates {
            vat_rate: dec!(0.075),
            tax_rate: dec!(0.03),
        };
        let a = assess(dec!(1234.57), rates);
        // 92.59275 and 37.0371
        assert_eq!(a.vat_amount, dec!(92.59));
        assert_eq!(a.tax_amount, dec!(37.04));
        assert_eq!(a.payable, dec!(1364.20));
    }

    #[test]
    fn due_date_is_fifteenth_of_next_month() {
        let today = date(2030, 1, 1);
        assert_eq!(due_date_for(2024, 5, today), date(2024, 6, 15));
        assert_eq!(due_date_for(2024, 1, today), date(2024, 2, 15));
        assert_eq!(due_date_for(2024, 11, today), date(2024, 12, 15));
    }

    #[test]
    fn december_rolls_into_next_year() {
        assert_eq!(due_date_for(2024, 12, date(2030, 1, 1)), date(2025, 1, 15));
    }

    #[test]
    fn impossible_period_falls_back_to_thirty_days() {
        let today = date(2024, 3, 10);
        assert_eq!(due_date_for(2024, 13, today), date(2024, 4, 9));
        assert_eq!(due_date_for(2024, 0, today), date(2024, 4, 9));
        assert_eq!(due_date_for(i32::MAX, 12, today), date(2024, 4, 9));
    }
}
