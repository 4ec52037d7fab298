//! Additive forecaster: piecewise-linear trend plus Fourier seasonalities.
//!
//! Fitting works in scaled units: `y / max|y|` and time mapped to `[0, 1]`
//! over the history. Coefficients get Gaussian priors (slope and offset sd
//! 5, changepoint deltas `changepoint_prior_scale`, seasonal terms
//! `seasonality_prior_scale`), which turns the MAP estimate into a ridge
//! system. The observation noise is estimated from residuals and the system
//! is solved a second time with that noise level.

use super::features::{
    changepoint_indices, day_number, piecewise_linear, trend_features_into, SeasonalTerm,
};
use super::linalg::{cholesky_solve, normal_equations};
use super::uncertainty::{sample_bounds, IntervalRequest, TrendParams};
use super::{ForecastError, Forecaster, ModelConfig, SeasonalityToggle};
use crate::domain::{Components, Forecast, ForecastRow, SeasonalProfiles, TrainingRow};
use crate::rng::SeedHierarchy;
use chrono::{Datelike, Days, NaiveDate};

const TREND_PRIOR_SD: f64 = 5.0;
const INITIAL_SIGMA: f64 = 0.5;
const MIN_SIGMA: f64 = 1e-3;

/// Reference week and year used for seasonal profiles (2017-01-02 is a Monday).
const PROFILE_MONDAY: (i32, u32, u32) = (2017, 1, 2);
const PROFILE_NEW_YEAR: (i32, u32, u32) = (2017, 1, 1);

/// The shipped `Forecaster`.
#[derive(Debug, Clone, Default)]
pub struct AdditiveForecaster {
    config: ModelConfig,
}

/// A fitted seasonality with its coefficients.
///
/// Feature columns are centered on their training means, so the effect
/// averages to zero over the observed days and the level stays in the trend.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedSeasonality {
    pub term: SeasonalTerm,
    pub beta: Vec<f64>,
    pub column_means: Vec<f64>,
}

impl FittedSeasonality {
    /// Effect at `date` in scaled units.
    fn effect(&self, date: NaiveDate) -> f64 {
        let centre: f64 = self
            .column_means
            .iter()
            .zip(&self.beta)
            .map(|(mean, b)| mean * b)
            .sum();
        self.term.effect(day_number(date), &self.beta) - centre
    }
}

/// Model state after `fit`.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    history: Vec<NaiveDate>,
    start_day: f64,
    span_days: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    k: f64,
    m: f64,
    deltas: Vec<f64>,
    yearly: Option<FittedSeasonality>,
    weekly: Option<FittedSeasonality>,
    sigma: f64,
    interval_width: f64,
    uncertainty_samples: usize,
    seed: u64,
}

fn validate_rows(rows: &[TrainingRow]) -> Result<(), ForecastError> {
    if rows.len() < 2 {
        return Err(ForecastError::TooFewRows { rows: rows.len() });
    }
    for (i, row) in rows.iter().enumerate() {
        if !row.value.is_finite() {
            return Err(ForecastError::NonFiniteValue { index: i });
        }
        if i > 0 && row.timestamp < rows[i - 1].timestamp {
            return Err(ForecastError::Unsorted { index: i });
        }
    }
    if rows[0].timestamp == rows[rows.len() - 1].timestamp {
        return Err(ForecastError::ZeroSpan);
    }
    Ok(())
}

fn resolve_toggle(toggle: SeasonalityToggle, auto: bool) -> bool {
    match toggle {
        SeasonalityToggle::Auto => auto,
        SeasonalityToggle::On => true,
        SeasonalityToggle::Off => false,
    }
}

impl AdditiveForecaster {
    pub fn new(config: ModelConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit the model to cleaned rows (ascending by timestamp).
    pub fn fit(&self, rows: &[TrainingRow]) -> Result<FittedModel, ForecastError> {
        validate_rows(rows)?;
        let cfg = &self.config;
        let n = rows.len();

        let first = rows[0].timestamp;
        let last = rows[n - 1].timestamp;
        let start_day = day_number(first);
        let span_days = day_number(last) - start_day;

        let y_scale = rows
            .iter()
            .map(|r| r.value.abs())
            .fold(0.0_f64, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let y: Vec<f64> = rows.iter().map(|r| r.value / y_scale).collect();
        let t: Vec<f64> = rows
            .iter()
            .map(|r| (day_number(r.timestamp) - start_day) / span_days)
            .collect();

        let changepoints: Vec<f64> =
            changepoint_indices(n, cfg.n_changepoints, cfg.changepoint_range)
                .into_iter()
                .map(|i| t[i])
                .collect();

        let min_spacing = rows
            .windows(2)
            .map(|w| (w[1].timestamp - w[0].timestamp).num_days())
            .filter(|d| *d > 0)
            .min()
            .unwrap_or(0);
        let yearly_on = resolve_toggle(cfg.yearly, span_days >= 730.0);
        let weekly_on = resolve_toggle(cfg.weekly, span_days >= 14.0 && min_spacing < 7);
        let yearly_term = yearly_on.then(|| SeasonalTerm::yearly(cfg.yearly_order));
        let weekly_term = weekly_on.then(|| SeasonalTerm::weekly(cfg.weekly_order));

        // Column layout: [k, m, δ..., yearly..., weekly...]
        let n_cp = changepoints.len();
        let yearly_width = yearly_term.map_or(0, |s| s.width());
        let weekly_width = weekly_term.map_or(0, |s| s.width());
        let p = 2 + n_cp + yearly_width + weekly_width;

        let mut design: Vec<Vec<f64>> = rows
            .iter()
            .zip(&t)
            .map(|(row, &ti)| {
                let mut x = Vec::with_capacity(p);
                trend_features_into(ti, &changepoints, &mut x);
                let day = day_number(row.timestamp);
                if let Some(term) = yearly_term {
                    term.features_into(day, &mut x);
                }
                if let Some(term) = weekly_term {
                    term.features_into(day, &mut x);
                }
                x
            })
            .collect();

        // Center seasonal columns; on business-day data they are otherwise
        // collinear with the intercept and soak up the price level.
        let seasonal_start = 2 + n_cp;
        let column_means: Vec<f64> = (seasonal_start..p)
            .map(|c| design.iter().map(|x| x[c]).sum::<f64>() / n as f64)
            .collect();
        for x in &mut design {
            for (c, mean) in (seasonal_start..p).zip(&column_means) {
                x[c] -= mean;
            }
        }

        let mut prior_precision = Vec::with_capacity(p);
        prior_precision.extend([TREND_PRIOR_SD.powi(-2); 2]);
        prior_precision.extend(std::iter::repeat(cfg.changepoint_prior_scale.powi(-2)).take(n_cp));
        prior_precision.extend(
            std::iter::repeat(cfg.seasonality_prior_scale.powi(-2))
                .take(yearly_width + weekly_width),
        );

        let (xtx, xty) = normal_equations(&design, &y, p);
        let solve = |sigma: f64| -> Result<Vec<f64>, ForecastError> {
            let mut a = xtx.clone();
            for i in 0..p {
                a[i * p + i] += sigma * sigma * prior_precision[i];
            }
            cholesky_solve(&a, &xty, p).ok_or(ForecastError::Singular)
        };
        let residual_sigma = |theta: &[f64]| -> f64 {
            let rss: f64 = design
                .iter()
                .zip(&y)
                .map(|(x, yi)| {
                    let fitted: f64 = x.iter().zip(theta).map(|(a, b)| a * b).sum();
                    (yi - fitted).powi(2)
                })
                .sum();
            (rss / n as f64).sqrt().max(MIN_SIGMA)
        };

        let theta = solve(INITIAL_SIGMA)?;
        let sigma = residual_sigma(&theta);
        let theta = solve(sigma)?;
        let sigma = residual_sigma(&theta);

        let mut offset = seasonal_start;
        let mut take_seasonality = |term: SeasonalTerm| {
            let (from, to) = (offset, offset + term.width());
            offset = to;
            FittedSeasonality {
                term,
                beta: theta[from..to].to_vec(),
                column_means: column_means[from - seasonal_start..to - seasonal_start].to_vec(),
            }
        };
        let yearly = yearly_term.map(&mut take_seasonality);
        let weekly = weekly_term.map(&mut take_seasonality);

        tracing::debug!(
            rows = n,
            changepoints = n_cp,
            yearly = yearly.is_some(),
            weekly = weekly.is_some(),
            sigma,
            "fitted additive model"
        );

        Ok(FittedModel {
            history: rows.iter().map(|r| r.timestamp).collect(),
            start_day,
            span_days,
            y_scale,
            changepoints,
            k: theta[0],
            m: theta[1],
            deltas: theta[2..2 + n_cp].to_vec(),
            yearly,
            weekly,
            sigma,
            interval_width: cfg.interval_width,
            uncertainty_samples: cfg.uncertainty_samples,
            seed: cfg.seed,
        })
    }
}

impl FittedModel {
    /// History dates followed by `periods` consecutive calendar days after
    /// the last observed date.
    pub fn make_future_dates(&self, periods: u32) -> Vec<NaiveDate> {
        let mut dates = self.history.clone();
        if let Some(&last) = self.history.last() {
            dates.extend((1..=u64::from(periods)).filter_map(|d| last.checked_add_days(Days::new(d))));
        }
        dates
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn changepoints(&self) -> &[f64] {
        &self.changepoints
    }

    /// Fitted observation noise in scaled units.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn has_yearly(&self) -> bool {
        self.yearly.is_some()
    }

    pub fn has_weekly(&self) -> bool {
        self.weekly.is_some()
    }

    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (day_number(date) - self.start_day) / self.span_days
    }

    fn trend_params(&self) -> TrendParams<'_> {
        TrendParams {
            k: self.k,
            m: self.m,
            changepoints: &self.changepoints,
            deltas: &self.deltas,
        }
    }

    /// Trend value at `date` in price units.
    pub fn trend_at(&self, date: NaiveDate) -> f64 {
        let t = self.scaled_time(date);
        piecewise_linear(t, self.k, self.m, &self.changepoints, &self.deltas) * self.y_scale
    }

    /// Predict every date (ascending; history dates first).
    pub fn predict(&self, dates: &[NaiveDate]) -> Result<Forecast, ForecastError> {
        let last_history = self.history.last().copied();
        let future_start = dates
            .iter()
            .position(|d| Some(*d) > last_history)
            .unwrap_or(dates.len());

        let t: Vec<f64> = dates.iter().map(|d| self.scaled_time(*d)).collect();
        let seasonal_of = |fit: &Option<FittedSeasonality>| -> Option<Vec<f64>> {
            fit.as_ref()
                .map(|s| dates.iter().map(|d| s.effect(*d)).collect())
        };
        let yearly = seasonal_of(&self.yearly);
        let weekly = seasonal_of(&self.weekly);
        let seasonal: Vec<f64> = (0..dates.len())
            .map(|j| {
                yearly.as_ref().map_or(0.0, |v| v[j]) + weekly.as_ref().map_or(0.0, |v| v[j])
            })
            .collect();

        let trend = self.trend_params();
        let bounds = sample_bounds(&IntervalRequest {
            trend,
            t: &t,
            seasonal: &seasonal,
            future_start,
            sigma: self.sigma,
            samples: self.uncertainty_samples,
            interval_width: self.interval_width,
            seeds: SeedHierarchy::new(self.seed),
        })?;

        let scale = self.y_scale;
        let trend_values: Vec<f64> = t.iter().map(|&ti| trend.at(ti)).collect();
        let rows = dates
            .iter()
            .enumerate()
            .map(|(j, &timestamp)| ForecastRow {
                timestamp,
                point_estimate: (trend_values[j] + seasonal[j]) * scale,
                lower_bound: bounds.lower[j] * scale,
                upper_bound: bounds.upper[j] * scale,
            })
            .collect();

        let to_price = |v: Vec<f64>| -> Vec<f64> { v.into_iter().map(|x| x * scale).collect() };
        Ok(Forecast {
            rows,
            components: Components {
                trend: to_price(trend_values),
                trend_lower: to_price(bounds.trend_lower),
                trend_upper: to_price(bounds.trend_upper),
                weekly: weekly.map(to_price),
                yearly: yearly.map(to_price),
            },
            profiles: self.profiles(),
            history_len: future_start,
            interval_width: self.interval_width,
        })
    }

    /// Weekly effect by weekday and yearly effect by day of year, in price units.
    pub fn profiles(&self) -> SeasonalProfiles {
        let (y, m, d) = PROFILE_MONDAY;
        let monday = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        let weekly = self.weekly.as_ref().map(|s| {
            (0..7)
                .filter_map(|i| monday.checked_add_days(Days::new(i)))
                .map(|date| (date.weekday(), s.effect(date) * self.y_scale))
                .collect()
        });

        let (y, m, d) = PROFILE_NEW_YEAR;
        let new_year = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        let yearly = self.yearly.as_ref().map(|s| {
            (0..365)
                .filter_map(|i| new_year.checked_add_days(Days::new(i)))
                .map(|date| (date.ordinal(), s.effect(date) * self.y_scale))
                .collect()
        });

        SeasonalProfiles { weekly, yearly }
    }
}

impl Forecaster for AdditiveForecaster {
    fn name(&self) -> &str {
        "additive"
    }

    fn forecast(&self, rows: &[TrainingRow], horizon_days: u32) -> Result<Forecast, ForecastError> {
        let model = self.fit(rows)?;
        let dates = model.make_future_dates(horizon_days);
        model.predict(&dates)
    }
}
