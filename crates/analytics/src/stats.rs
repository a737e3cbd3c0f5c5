//! Small statistics helpers shared by the forecaster and the health scorer.
//!
//! All arithmetic stays in `Decimal`; standard deviations are population
//! standard deviations (divide by `n`). Intermediate results that leave the
//! `Decimal` range saturate at `Decimal::MAX` / `Decimal::MIN` instead of
//! panicking, so callers only ever see clamped scores.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `num / den`, saturating on overflow. `den` must be non-zero.
pub(crate) fn saturating_div(num: Decimal, den: Decimal) -> Decimal {
    num.checked_div(den).unwrap_or_else(|| {
        if num.is_sign_negative() != den.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

/// Sum that saturates instead of overflowing.
pub(crate) fn saturating_sum<'a>(values: impl IntoIterator<Item = &'a Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
}

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let n = Decimal::from(values.len());
    let total = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v));
    Some(match total {
        Some(total) => total / n,
        // The total is out of range, its per-item shares are not.
        None => values
            .iter()
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v / n)),
    })
}

/// Population standard deviation. Zero for an empty slice.
///
/// Saturates at `Decimal::MAX` when the squared deviations leave the `Decimal`
/// range.
pub fn std_dev(values: &[Decimal]) -> Decimal {
    let Some(mean) = mean(values) else {
        return Decimal::ZERO;
    };
    let squares = values.iter().try_fold(Decimal::ZERO, |acc, v| {
        let deviation = v.checked_sub(mean)?;
        acc.checked_add(deviation.checked_mul(deviation)?)
    });
    match squares {
        Some(squares) => (squares / Decimal::from(values.len()))
            .sqrt()
            .unwrap_or(Decimal::ZERO),
        None => Decimal::MAX,
    }
}

/// Clamps `value` into `[min, max]`.
pub fn clamp(value: Decimal, min: Decimal, max: Decimal) -> Decimal {
    value.max(min).min(max)
}

/// A fitted straight line `value = slope * t + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendLine {
    pub slope: Decimal,
    pub intercept: Decimal,
}

impl TrendLine {
    pub fn predict(&self, t: usize) -> Decimal {
        self.slope
            .saturating_mul(Decimal::from(t))
            .saturating_add(self.intercept)
    }

    /// Ordinary least-squares fit of `values` against the indices `0..n`.
    ///
    /// Returns `None` for an empty slice. A single point yields a flat line
    /// through it.
    pub fn fit(values: &[Decimal]) -> Option<Self> {
        let mean_y = mean(values)?;
        let n = values.len();
        let mean_t = Decimal::from(n - 1) / Decimal::TWO;

        let mut sxx = Decimal::ZERO;
        let mut sxy = Decimal::ZERO;
        for (t, y) in values.iter().enumerate() {
            let dt = Decimal::from(t) - mean_t;
            sxx += dt * dt;
            sxy = sxy.saturating_add(dt.saturating_mul(y.saturating_sub(mean_y)));
        }

        let slope = if sxx.is_zero() {
            Decimal::ZERO
        } else {
            saturating_div(sxy, sxx)
        };
        Some(Self {
            slope,
            intercept: mean_y.saturating_sub(slope.saturating_mul(mean_t)),
        })
    }

    /// Observed minus fitted value for every index.
    pub fn residuals(&self, values: &[Decimal]) -> Vec<Decimal> {
        values
            .iter()
            .enumerate()
            .map(|(t, y)| y.saturating_sub(self.predict(t)))
            .collect()
    }
}
