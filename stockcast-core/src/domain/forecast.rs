//! Forecaster output types.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One row per day in history-plus-horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub timestamp: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Additive components aligned index-for-index with `Forecast::rows`.
///
/// `weekly` and `yearly` are `None` when that seasonality was not fitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub trend: Vec<f64>,
    pub trend_lower: Vec<f64>,
    pub trend_upper: Vec<f64>,
    pub weekly: Option<Vec<f64>>,
    pub yearly: Option<Vec<f64>>,
}

/// Seasonal effect over one full period, for component charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalProfiles {
    /// Weekly effect, Monday first.
    pub weekly: Option<Vec<(Weekday, f64)>>,
    /// Yearly effect by day of year (1-based ordinal of a non-leap year).
    pub yearly: Option<Vec<(u32, f64)>>,
}

/// Full forecaster result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub rows: Vec<ForecastRow>,
    pub components: Components,
    pub profiles: SeasonalProfiles,
    /// Number of leading rows that cover observed history.
    pub history_len: usize,
    /// Width of the uncertainty interval, e.g. 0.8.
    pub interval_width: f64,
}

impl Forecast {
    /// Last `n` rows (fewer if the forecast is shorter).
    pub fn tail(&self, n: usize) -> &[ForecastRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }

    /// Rows beyond the observed history.
    pub fn future(&self) -> &[ForecastRow] {
        &self.rows[self.history_len.min(self.rows.len())..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast_with(n: usize, history_len: usize) -> Forecast {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows = (0..n)
            .map(|i| ForecastRow {
                timestamp: start + chrono::Days::new(i as u64),
                point_estimate: i as f64,
                lower_bound: i as f64 - 1.0,
                upper_bound: i as f64 + 1.0,
            })
            .collect();
        Forecast {
            rows,
            history_len,
            interval_width: 0.8,
            ..Default::default()
        }
    }

    #[test]
    fn tail_returns_last_rows() {
        let f = forecast_with(10, 7);
        let tail = f.tail(5);
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0].point_estimate, 5.0);
        assert_eq!(tail[4].point_estimate, 9.0);
    }

    #[test]
    fn tail_longer_than_forecast() {
        let f = forecast_with(3, 3);
        assert_eq!(f.tail(5).len(), 3);
    }

    #[test]
    fn future_skips_history() {
        let f = forecast_with(10, 7);
        assert_eq!(f.future().len(), 3);
        assert_eq!(f.future()[0].point_estimate, 7.0);
    }
}
