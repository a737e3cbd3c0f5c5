use crate::cache::ModelCache;
use crate::stats::{self, TrendLine};
use chrono::{DateTime, Utc};
use core_types::{MonthlyPoint, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number of months projected past the end of the series.
pub const FORECAST_HORIZON: usize = 3;

/// Shortest series the forecaster will fit.
pub const DEFAULT_MIN_POINTS: usize = 6;

/// One projected month, `month_offset` months after the last observed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub month_offset: u8,
    pub value: Decimal,
}

/// A short-horizon projection of the monthly net value.
///
/// `confidence` is a heuristic in `[0, 1]` derived from how tightly the series
/// hugs its trend line. It is not a statistical prediction interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub predictions: Vec<Prediction>,
    pub confidence: Decimal,
    pub trained_at: DateTime<Utc>,
}

/// A fitted trend and the size of the series it was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendModel {
    pub line: TrendLine,
    pub points: usize,
    pub trained_at: DateTime<Utc>,
}

/// Fits a least-squares line through a monthly series and projects it forward.
#[derive(Clone)]
pub struct Forecaster {
    min_points: usize,
    cache: Option<Arc<dyn ModelCache>>,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_POINTS)
    }
}

impl std::fmt::Debug for Forecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forecaster")
            .field("min_points", &self.min_points)
            .field("cached_models", &self.cache.as_ref().map(|c| c.len()))
            .finish()
    }
}

impl Forecaster {
    pub fn new(min_points: usize) -> Self {
        Self {
            min_points,
            cache: None,
        }
    }

    /// Attaches a model cache used by [`Forecaster::forecast_for_user`].
    pub fn with_cache(mut self, cache: Arc<dyn ModelCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Projects the next three months of an ordered series of net values.
    ///
    /// Returns `None` when the series is shorter than the configured minimum;
    /// that is a normal "not enough history yet" outcome.
    pub fn forecast(&self, values: &[Decimal]) -> Option<ForecastResult> {
        self.fit(values).map(|model| project(&model, values))
    }

    /// Like [`Forecaster::forecast`], for dated points in any order.
    pub fn forecast_points(&self, points: &[MonthlyPoint]) -> Option<ForecastResult> {
        self.forecast(&chronological_values(points))
    }

    /// Forecasts a user's series and remembers the fitted model in the cache.
    pub fn forecast_for_user(
        &self,
        user_id: UserId,
        points: &[MonthlyPoint],
    ) -> Option<ForecastResult> {
        let values = chronological_values(points);
        let model = self.fit(&values)?;
        if let Some(cache) = &self.cache {
            cache.put(user_id, model);
        }
        Some(project(&model, &values))
    }

    /// The last model fitted for `user_id`, if the cache still holds it.
    pub fn cached_model(&self, user_id: UserId) -> Option<TrendModel> {
        self.cache.as_ref()?.get(user_id)
    }

    fn fit(&self, values: &[Decimal]) -> Option<TrendModel> {
        if values.len() < self.min_points.max(1) {
            tracing::debug!(
                points = values.len(),
                required = self.min_points,
                "Series too short to forecast."
            );
            return None;
        }
        let line = TrendLine::fit(values)?;
        Some(TrendModel {
            line,
            points: values.len(),
            trained_at: Utc::now(),
        })
    }
}

/// Convenience form of [`Forecaster::forecast`] with the default minimum length.
pub fn forecast(values: &[Decimal]) -> Option<ForecastResult> {
    Forecaster::default().forecast(values)
}

/// `1 - std(residuals) / mean(|value|)`, clamped to `[0, 1]`.
///
/// A zero mean magnitude is replaced by 1. A spread too large to divide out
/// gives 0.
pub fn confidence(line: &TrendLine, values: &[Decimal]) -> Decimal {
    let residual_spread = stats::std_dev(&line.residuals(values));
    let magnitudes: Vec<Decimal> = values.iter().map(|v| v.abs()).collect();
    let scale = match stats::mean(&magnitudes) {
        Some(m) if m > Decimal::ZERO => m,
        _ => Decimal::ONE,
    };
    match residual_spread.checked_div(scale) {
        Some(ratio) => stats::clamp(Decimal::ONE - ratio, Decimal::ZERO, Decimal::ONE),
        None => Decimal::ZERO,
    }
}

fn project(model: &TrendModel, values: &[Decimal]) -> ForecastResult {
    let n = values.len();
    let predictions = (1..=FORECAST_HORIZON)
        .map(|offset| Prediction {
            month_offset: offset as u8,
            value: model.line.predict(n + offset - 1),
        })
        .collect();

    ForecastResult {
        predictions,
        confidence: confidence(&model.line, values),
        trained_at: model.trained_at,
    }
}

fn chronological_values(points: &[MonthlyPoint]) -> Vec<Decimal> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| (p.year, p.month));
    sorted.into_iter().map(|p| p.value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BoundedModelCache;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn values(raw: &[i64]) -> Vec<Decimal> {
        raw.iter().copied().map(Decimal::from).collect()
    }

    #[test]
    fn linear_series_projects_exactly() {
        let result = forecast(&values(&[100, 200, 300, 400, 500, 600])).unwrap();
        let projected: Vec<_> = result.predictions.iter().map(|p| (p.month_offset, p.value)).collect();
        assert_eq!(
            projected,
            vec![(1, dec!(700)), (2, dec!(800)), (3, dec!(900))]
        );
        assert_eq!(result.confidence, Decimal::ONE);
    }

    #[test]
    fn short_series_is_unavailable() {
        for len in 0..DEFAULT_MIN_POINTS {
            assert!(forecast(&vec![dec!(10); len]).is_none(), "length {len}");
        }
    }

    #[test]
    fn noisy_series_has_bounded_confidence() {
        let series = values(&[1200, -300, 4500, 80, 2600, -1500, 900, 3000, -2000, 150, 40, 7000]);
        let result = forecast(&series).unwrap();
        assert_eq!(result.predictions.len(), FORECAST_HORIZON);
        assert!(result.confidence >= Decimal::ZERO && result.confidence <= Decimal::ONE);
        assert!(result.confidence < Decimal::ONE);
    }

    #[test]
    fn all_zero_series_is_fully_confident() {
        let result = forecast(&vec![Decimal::ZERO; 12]).unwrap();
        assert!(result.predictions.iter().all(|p| p.value.is_zero()));
        assert_eq!(result.confidence, Decimal::ONE);
    }

    #[test]
    fn wildly_noisy_series_clamps_to_zero() {
        // Residual spread far exceeds the mean magnitude.
        let series = values(&[1, -1000, 1, 1000, 1, -1000, 1, 1000]);
        let line = TrendLine::fit(&series).unwrap();
        let c = confidence(&line, &series);
        assert!(c >= Decimal::ZERO && c <= Decimal::ONE);
    }

    #[test]
    fn dated_points_are_sorted_before_fitting() {
        let mut points: Vec<MonthlyPoint> = (1..=6)
            .map(|m| MonthlyPoint {
                year: 2024,
                month: m,
                value: Decimal::from(m * 10),
            })
            .collect();
        points.reverse();
        let result = Forecaster::default().forecast_points(&points).unwrap();
        assert_eq!(result.predictions[0].value, dec!(70));
    }

    #[test]
    fn per_user_forecast_populates_cache() {
        let cache = Arc::new(BoundedModelCache::new(8, Duration::from_secs(600)));
        let forecaster = Forecaster::default().with_cache(cache.clone());
        let points: Vec<MonthlyPoint> = (1..=6)
            .map(|m| MonthlyPoint {
                year: 2024,
                month: m,
                value: Decimal::from(m),
            })
            .collect();

        let fresh = forecaster.forecast_for_user(42, &points).unwrap();
        let model = forecaster.cached_model(42).unwrap();
        assert_eq!(model.line.slope, Decimal::ONE);
        assert_eq!(model.points, 6);

        // Dropping the cached model does not change the answer.
        cache.evict(42);
        let refit = forecaster.forecast_for_user(42, &points).unwrap();
        assert_eq!(fresh.predictions, refit.predictions);
        assert_eq!(fresh.confidence, refit.confidence);
    }

    #[test]
    fn custom_minimum_is_honoured() {
        let forecaster = Forecaster::new(3);
        assert!(forecaster.forecast(&values(&[1, 2])).is_none());
        assert!(forecaster.forecast(&values(&[1, 2, 3])).is_some());
    }

    #[test]
    fn spike_of_a_quadrillion_still_forecasts() {
        let mut series = vec![Decimal::ZERO; 12];
        series[5] = Decimal::from(10_i64.pow(15));
        let result = forecast(&series).unwrap();
        assert_eq!(result.predictions.len(), FORECAST_HORIZON);
        assert!(result.confidence >= Decimal::ZERO && result.confidence <= Decimal::ONE);
    }

    #[test]
    fn series_at_the_decimal_limits_has_zero_confidence() {
        let series: Vec<Decimal> = (0..8)
            .map(|i| if i % 2 == 0 { Decimal::MAX } else { Decimal::MIN })
            .collect();
        let result = forecast(&series).unwrap();
        assert_eq!(result.predictions.len(), FORECAST_HORIZON);
        assert_eq!(result.confidence, Decimal::ZERO);
    }
}
