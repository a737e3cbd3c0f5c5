use chrono::{Datelike, NaiveDate, Utc};
use core_types::{MonthlyPoint, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default length of the trailing series, in calendar months.
pub const DEFAULT_WINDOW_MONTHS: usize = 12;

/// A dense, chronologically ordered run of monthly net values.
///
/// There is exactly one point per calendar month and no gaps, which the
/// forecaster and the health scorer rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlySeries {
    points: Vec<MonthlyPoint>,
}

impl MonthlySeries {
    pub fn points(&self) -> &[MonthlyPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<MonthlyPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The signed net values, oldest first.
    pub fn values(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Positive part of each net value.
    ///
    /// This is a reconstruction from the netted value, not the gross income of the
    /// month: a month with 100 income and 40 expense reports 60 here.
    pub fn income(&self) -> Vec<Decimal> {
        self.points
            .iter()
            .map(|p| p.value.max(Decimal::ZERO))
            .collect()
    }

    /// Negative part of each net value, as a non-negative amount.
    pub fn expense(&self) -> Vec<Decimal> {
        self.points
            .iter()
            .map(|p| (-p.value).max(Decimal::ZERO))
            .collect()
    }
}

fn month_index(year: i32, month: u32) -> i64 {
    i64::from(year) * 12 + i64::from(month) - 1
}

fn from_month_index(index: i64) -> (i32, u32) {
    // Month indices come from valid chrono dates, so the year always fits.
    let year = index.div_euclid(12) as i32;
    let month = index.rem_euclid(12) as u32 + 1;
    (year, month)
}

/// Groups transactions into signed monthly totals for the `window` months ending
/// with the month of `as_of`, oldest first.
///
/// Income adds its amount, expense subtracts it. Months without activity appear
/// with a zero value; transactions outside the window are ignored.
pub fn aggregate_monthly(
    transactions: &[Transaction],
    window: usize,
    as_of: NaiveDate,
) -> MonthlySeries {
    let last = month_index(as_of.year(), as_of.month());
    let first = last - window as i64 + 1;

    let mut buckets: HashMap<i64, Decimal> = HashMap::new();
    for tx in transactions {
        let index = month_index(tx.date.year(), tx.date.month());
        if (first..=last).contains(&index) {
            let bucket = buckets.entry(index).or_default();
            *bucket = bucket.saturating_add(tx.signed_amount());
        }
    }

    let points = (first..=last)
        .map(|index| {
            let (year, month) = from_month_index(index);
            MonthlyPoint {
                year,
                month,
                value: buckets.get(&index).copied().unwrap_or_default(),
            }
        })
        .collect();

    tracing::trace!(
        transactions = transactions.len(),
        window,
        active_months = buckets.len(),
        "Aggregated ledger into monthly series."
    );

    MonthlySeries { points }
}

/// [`aggregate_monthly`] against today's UTC date.
pub fn aggregate_trailing(transactions: &[Transaction], window: usize) -> MonthlySeries {
    aggregate_monthly(transactions, window, Utc::now().date_naive())
}

/// Sum of income amounts dated within the given calendar month: the tax base.
pub fn taxable_income(transactions: &[Transaction], year: i32, month: u32) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.is_income() && tx.date.year() == year && tx.date.month() == month)
        .fold(Decimal::ZERO, |acc, tx| acc.saturating_add(tx.amount))
}

/// All-time totals of a ledger, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub profit_total: Decimal,
}

pub fn ledger_totals(transactions: &[Transaction]) -> LedgerTotals {
    let (income, expense) =
        transactions
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(income, expense), tx| {
                if tx.is_income() {
                    (income.saturating_add(tx.amount), expense)
                } else {
                    (income, expense.saturating_add(tx.amount))
                }
            });

    LedgerTotals {
        income_total: income.round_dp(2),
        expense_total: expense.round_dp(2),
        profit_total: income.saturating_sub(expense).round_dp(2),
    }
}

/// Net amount booked against one category and its share of total income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Decimal,
    /// `amount / total income * 100`, rounded to 2 places. Zero when there is no income.
    pub percentage: Decimal,
}

/// Per-category signed totals, sorted by category name.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryShare> {
    let total_income = transactions
        .iter()
        .filter(|tx| tx.is_income())
        .fold(Decimal::ZERO, |acc, tx| acc.saturating_add(tx.amount));

    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for tx in transactions {
        let total = totals.entry(tx.category.as_str()).or_default();
        *total = total.saturating_add(tx.signed_amount());
    }

    totals
        .into_iter()
        .map(|(category, amount)| {
            let percentage = if total_income.is_zero() {
                Decimal::ZERO
            } else {
                (amount / total_income)
                    .saturating_mul(Decimal::ONE_HUNDRED)
                    .round_dp(2)
            };
            CategoryShare {
                category: category.to_string(),
                amount,
                percentage,
            }
        })
        .collect()
}
