//! Simulated uncertainty intervals.
//!
//! Future trend paths extend the fitted trend with new changepoints: the
//! count is Poisson at the historical changepoint rate and each slope change
//! is Laplace-distributed with the mean absolute fitted change as scale.
//! Every sample adds Gaussian observation noise. Bounds are percentiles of
//! the sampled values.
//!
//! Each trend path and each point's noise stream draws from its own BLAKE3
//! sub-seed, so results are identical for any rayon thread count.

use super::features::piecewise_linear;
use super::ForecastError;
use crate::rng::SeedHierarchy;
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};
use rayon::prelude::*;

/// Fitted trend in scaled units.
#[derive(Debug, Clone, Copy)]
pub struct TrendParams<'a> {
    pub k: f64,
    pub m: f64,
    pub changepoints: &'a [f64],
    pub deltas: &'a [f64],
}

impl TrendParams<'_> {
    pub fn at(&self, t: f64) -> f64 {
        piecewise_linear(t, self.k, self.m, self.changepoints, self.deltas)
    }
}

/// Lower/upper bounds for the forecast and its trend, in scaled units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampledBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub trend_lower: Vec<f64>,
    pub trend_upper: Vec<f64>,
}

/// Sampling inputs for one prediction.
pub struct IntervalRequest<'a> {
    pub trend: TrendParams<'a>,
    /// Scaled time of every output row, ascending.
    pub t: &'a [f64],
    /// Seasonal contribution of every output row.
    pub seasonal: &'a [f64],
    /// Index of the first row after the history.
    pub future_start: usize,
    pub sigma: f64,
    pub samples: usize,
    pub interval_width: f64,
    pub seeds: SeedHierarchy,
}

/// Linear-interpolated percentile of a sorted slice, `q` in `[0, 1]`.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Laplace(0, scale) by inverse CDF.
pub fn sample_laplace<R: Rng + ?Sized>(rng: &mut R, scale: f64) -> f64 {
    let u: f64 = rng.gen::<f64>() - 0.5;
    let tail = (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE);
    -scale * u.signum() * tail.ln()
}

/// One simulated future trend path, evaluated at `future_t`.
fn sample_trend_path<R: Rng>(
    rng: &mut R,
    trend: &TrendParams<'_>,
    future_t: &[f64],
    t_max: f64,
) -> Result<Vec<f64>, ForecastError> {
    let rate = trend.changepoints.len() as f64 * (t_max - 1.0);
    let n_new = if rate > 0.0 {
        let poisson = Poisson::new(rate).map_err(|e| ForecastError::Sampling(e.to_string()))?;
        let draw: f64 = poisson.sample(rng);
        draw as usize
    } else {
        0
    };

    let scale = trend.deltas.iter().map(|d| d.abs()).sum::<f64>()
        / trend.deltas.len().max(1) as f64
        + 1e-8;
    let new_changes: Vec<(f64, f64)> = (0..n_new)
        .map(|_| (rng.gen_range(1.0..t_max), sample_laplace(rng, scale)))
        .collect();

    Ok(future_t
        .iter()
        .map(|&t| {
            let extra: f64 = new_changes
                .iter()
                .map(|&(s, d)| d * (t - s).max(0.0))
                .sum();
            trend.at(t) + extra
        })
        .collect())
}

/// Sample bounds for every row.
///
/// With `samples == 0` every bound equals the point estimate. Bounds are
/// clamped so that `lower <= point <= upper` always holds.
pub fn sample_bounds(req: &IntervalRequest<'_>) -> Result<SampledBounds, ForecastError> {
    let n = req.t.len();
    let point_trend: Vec<f64> = req.t.iter().map(|&t| req.trend.at(t)).collect();

    if req.samples == 0 {
        let point: Vec<f64> = point_trend
            .iter()
            .zip(req.seasonal)
            .map(|(tr, s)| tr + s)
            .collect();
        return Ok(SampledBounds {
            lower: point.clone(),
            upper: point,
            trend_lower: point_trend.clone(),
            trend_upper: point_trend,
        });
    }

    let future_t = &req.t[req.future_start.min(n)..];
    let t_max = future_t.last().copied().unwrap_or(1.0);

    let paths: Vec<Vec<f64>> = if future_t.is_empty() || t_max <= 1.0 {
        Vec::new()
    } else {
        (0..req.samples)
            .into_par_iter()
            .map(|s| {
                let mut rng = req.seeds.rng_for("trend", s as u64);
                sample_trend_path(&mut rng, &req.trend, future_t, t_max)
            })
            .collect::<Result<_, _>>()?
    };

    let noise = Normal::new(0.0, req.sigma).map_err(|e| ForecastError::Sampling(e.to_string()))?;
    let lo_q = (1.0 - req.interval_width) / 2.0;
    let hi_q = (1.0 + req.interval_width) / 2.0;

    let per_row: Vec<(f64, f64, f64, f64)> = (0..n)
        .into_par_iter()
        .map(|j| {
            let mut trend_samples: Vec<f64> = if j >= req.future_start && !paths.is_empty() {
                paths.iter().map(|p| p[j - req.future_start]).collect()
            } else {
                vec![point_trend[j]; req.samples]
            };

            let mut rng = req.seeds.rng_for("noise", j as u64);
            let mut yhat_samples: Vec<f64> = trend_samples
                .iter()
                .map(|tr| tr + req.seasonal[j] + noise.sample(&mut rng))
                .collect();

            trend_samples.sort_by(|a, b| a.total_cmp(b));
            yhat_samples.sort_by(|a, b| a.total_cmp(b));

            let point = point_trend[j] + req.seasonal[j];
            (
                percentile(&yhat_samples, lo_q).min(point),
                percentile(&yhat_samples, hi_q).max(point),
                percentile(&trend_samples, lo_q).min(point_trend[j]),
                percentile(&trend_samples, hi_q).max(point_trend[j]),
            )
        })
        .collect();

    let mut bounds = SampledBounds {
        lower: Vec::with_capacity(n),
        upper: Vec::with_capacity(n),
        trend_lower: Vec::with_capacity(n),
        trend_upper: Vec::with_capacity(n),
    };
    for (lo, hi, tlo, thi) in per_row {
        bounds.lower.push(lo);
        bounds.upper.push(hi);
        bounds.trend_lower.push(tlo);
        bounds.trend_upper.push(thi);
    }
    Ok(bounds)
}
