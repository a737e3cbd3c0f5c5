//! Business health scoring.
//!
//! Four signals over the same trailing window, each normalized to `[0, 100]`:
//!
//! | Signal             | Weight |
//! |--------------------|--------|
//! | Profit trend       | 40%    |
//! | Liquidity          | 30%    |
//! | Tax burden         | 20%    |
//! | Expense volatility | 10%    |
//!
//! The normalizations are heuristics, not calibrated models. A term too large
//! for `Decimal` saturates, so its sub-score lands on the 0 or 100 bound.

use crate::stats::{self, TrendLine};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Score reported when there is no history to judge.
pub const INSUFFICIENT_DATA_SCORE: u8 = 20;

const WEIGHT_PROFIT_TREND: Decimal = dec!(0.4);
const WEIGHT_LIQUIDITY: Decimal = dec!(0.3);
const WEIGHT_TAX_BURDEN: Decimal = dec!(0.2);
const WEIGHT_EXPENSE_VOLATILITY: Decimal = dec!(0.1);

const NEUTRAL: Decimal = dec!(50);
const MAX_SUB_SCORE: Decimal = dec!(100);

/// The individual sub-scores behind a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBreakdown {
    pub profit_trend: Decimal,
    pub liquidity: Decimal,
    pub tax_burden: Decimal,
    pub expense_volatility: Decimal,
    pub score: u8,
}

fn bounded(value: Decimal) -> Decimal {
    stats::clamp(value, Decimal::ZERO, MAX_SUB_SCORE)
}

/// Computes every sub-score, or `None` when either series is empty.
///
/// When the arrays differ in length only the trailing `min(len)` months of each
/// are used.
pub fn health_breakdown(
    monthly_income: &[Decimal],
    monthly_expense: &[Decimal],
    tax_due: Decimal,
) -> Option<HealthBreakdown> {
    let n = monthly_income.len().min(monthly_expense.len());
    if n == 0 {
        return None;
    }
    let income = &monthly_income[monthly_income.len() - n..];
    let expense = &monthly_expense[monthly_expense.len() - n..];
    let profit: Vec<Decimal> = income
        .iter()
        .zip(expense)
        .map(|(i, e)| i.saturating_sub(*e))
        .collect();

    // 1. Profit trend: each unit of monthly slope moves the score one point.
    let slope = TrendLine::fit(&profit).map(|l| l.slope).unwrap_or_default();
    let profit_trend = bounded(NEUTRAL.saturating_add(slope));

    // 2. Liquidity: latest month against the window average.
    let current_profit = profit[n - 1];
    let avg_profit = match stats::mean(&profit) {
        Some(avg) if !avg.is_zero() => avg,
        _ => Decimal::ONE,
    };
    let deviation = current_profit.saturating_sub(avg_profit)
        / avg_profit.abs().saturating_add(Decimal::ONE);
    let liquidity = bounded(NEUTRAL.saturating_add(deviation.saturating_mul(NEUTRAL)));

    // 3. Tax burden: outstanding tax relative to income over the window.
    let total_income = stats::saturating_sum(income);
    let burden = tax_due / total_income.saturating_add(Decimal::ONE);
    let tax_burden = bounded(MAX_SUB_SCORE.saturating_sub(burden.saturating_mul(MAX_SUB_SCORE)));

    // 4. Expense volatility: coefficient of variation of expenses.
    let expense_mean = stats::mean(expense).unwrap_or_default();
    let variation = stats::std_dev(expense) / expense_mean.saturating_add(Decimal::ONE);
    let expense_volatility =
        bounded(MAX_SUB_SCORE.saturating_sub(variation.saturating_mul(NEUTRAL)));

    let weighted = WEIGHT_PROFIT_TREND * profit_trend
        + WEIGHT_LIQUIDITY * liquidity
        + WEIGHT_TAX_BURDEN * tax_burden
        + WEIGHT_EXPENSE_VOLATILITY * expense_volatility;
    let score = bounded(weighted.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
        .to_u8()
        .unwrap_or(INSUFFICIENT_DATA_SCORE);

    Some(HealthBreakdown {
        profit_trend,
        liquidity,
        tax_burden,
        expense_volatility,
        score,
    })
}

/// A single business health score in `[0, 100]`.
///
/// Empty history yields [`INSUFFICIENT_DATA_SCORE`].
pub fn health_score(monthly_income: &[Decimal], monthly_expense: &[Decimal], tax_due: Decimal) -> u8 {
    health_breakdown(monthly_income, monthly_expense, tax_due)
        .map(|b| b.score)
        .unwrap_or(INSUFFICIENT_DATA_SCORE)
}
