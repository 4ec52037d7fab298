//! Regressors for the additive model: piecewise-linear trend and Fourier
//! seasonal terms.

use chrono::NaiveDate;
use std::f64::consts::PI;

pub const YEARLY_PERIOD: f64 = 365.25;
pub const WEEKLY_PERIOD: f64 = 7.0;

/// Days since 1970-01-01.
pub fn day_number(date: NaiveDate) -> f64 {
    (date - NaiveDate::default()).num_days() as f64
}

/// A Fourier series with `order` sine/cosine pairs over `period` days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalTerm {
    pub period: f64,
    pub order: usize,
}

impl SeasonalTerm {
    pub fn yearly(order: usize) -> Self {
        Self {
            period: YEARLY_PERIOD,
            order,
        }
    }

    pub fn weekly(order: usize) -> Self {
        Self {
            period: WEEKLY_PERIOD,
            order,
        }
    }

    /// Number of regressor columns.
    pub fn width(&self) -> usize {
        2 * self.order
    }

    /// Append `[sin(2πkt/P), cos(2πkt/P)]` for k = 1..=order.
    pub fn features_into(&self, day: f64, out: &mut Vec<f64>) {
        for k in 1..=self.order {
            let x = 2.0 * PI * k as f64 * day / self.period;
            out.push(x.sin());
            out.push(x.cos());
        }
    }

    /// Seasonal effect at `day` for fitted coefficients.
    pub fn effect(&self, day: f64, beta: &[f64]) -> f64 {
        let mut acc = 0.0;
        for k in 1..=self.order {
            let x = 2.0 * PI * k as f64 * day / self.period;
            acc += beta[2 * (k - 1)] * x.sin() + beta[2 * (k - 1) + 1] * x.cos();
        }
        acc
    }
}

/// Row indexes of trend changepoints.
///
/// Changepoints sit at evenly spaced (rounded) rows within the first
/// `range` fraction of the history, excluding the first row. The count is
/// capped so each changepoint gets its own row.
pub fn changepoint_indices(history_len: usize, n_changepoints: usize, range: f64) -> Vec<usize> {
    let hist_size = (history_len as f64 * range).floor() as usize;
    let n = n_changepoints.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }
    let last = (hist_size - 1) as f64;
    (1..=n)
        .map(|i| (last * i as f64 / n as f64).round() as usize)
        .collect()
}

/// Append trend regressors at scaled time `t`: `[t, 1, (t - s_1)+, ...]`.
pub fn trend_features_into(t: f64, changepoints: &[f64], out: &mut Vec<f64>) {
    out.push(t);
    out.push(1.0);
    out.extend(changepoints.iter().map(|&s| (t - s).max(0.0)));
}

/// Piecewise-linear trend: `k·t + m + Σ δ_j (t - s_j)+`.
pub fn piecewise_linear(t: f64, k: f64, m: f64, changepoints: &[f64], deltas: &[f64]) -> f64 {
    let bends: f64 = changepoints
        .iter()
        .zip(deltas)
        .map(|(&s, &d)| d * (t - s).max(0.0))
        .sum();
    k * t + m + bends
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_number_of_epoch_is_zero() {
        assert_eq!(day_number(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0.0);
        assert_eq!(day_number(NaiveDate::from_ymd_opt(1970, 1, 11).unwrap()), 10.0);
    }

    #[test]
    fn fourier_width_and_period() {
        let term = SeasonalTerm::weekly(3);
        let mut a = Vec::new();
        let mut b = Vec::new();
        term.features_into(3.0, &mut a);
        term.features_into(3.0 + WEEKLY_PERIOD, &mut b);
        assert_eq!(a.len(), term.width());
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn effect_matches_features_dot_beta() {
        let term = SeasonalTerm::yearly(2);
        let beta = [0.5, -1.0, 0.25, 2.0];
        let mut f = Vec::new();
        term.features_into(100.0, &mut f);
        let dot: f64 = f.iter().zip(&beta).map(|(x, b)| x * b).sum();
        assert!((term.effect(100.0, &beta) - dot).abs() < 1e-12);
    }

    #[test]
    fn changepoints_spread_over_leading_history() {
        let idx = changepoint_indices(101, 4, 0.8);
        // hist_size = 80, linspace(0, 79, 5)[1..]
        assert_eq!(idx, vec![20, 40, 59, 79]);
    }

    #[test]
    fn changepoints_capped_by_history() {
        assert_eq!(changepoint_indices(5, 25, 0.8), vec![1, 2, 3]);
        assert!(changepoint_indices(1, 25, 0.8).is_empty());
        assert!(changepoint_indices(100, 0, 0.8).is_empty());
    }

    #[test]
    fn piecewise_linear_bends_after_changepoint() {
        let cps = [0.5];
        let deltas = [2.0];
        assert_eq!(piecewise_linear(0.25, 1.0, 0.0, &cps, &deltas), 0.25);
        assert!((piecewise_linear(1.0, 1.0, 0.0, &cps, &deltas) - 2.0).abs() < 1e-12);

        let mut f = Vec::new();
        trend_features_into(1.0, &cps, &mut f);
        assert_eq!(f, vec![1.0, 1.0, 0.5]);
    }
}
