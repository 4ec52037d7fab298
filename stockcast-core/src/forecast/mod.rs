//! Forecasting: the `Forecaster` trait and the additive trend + seasonality model.
//!
//! The model follows the decomposable layout popularised by Prophet:
//! piecewise-linear trend with changepoints, Fourier seasonalities, Gaussian
//! priors fitted as a ridge problem, and simulated uncertainty intervals.

pub mod features;
pub mod linalg;
pub mod model;
pub mod uncertainty;

pub use model::{AdditiveForecaster, FittedModel};

use crate::domain::{Forecast, TrainingRow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("need at least 2 rows to fit, got {rows}")]
    TooFewRows { rows: usize },

    #[error("history spans zero days")]
    ZeroSpan,

    #[error("non-finite value at row {index}")]
    NonFiniteValue { index: usize },

    #[error("timestamps are not ascending at row {index}")]
    Unsorted { index: usize },

    #[error("normal equations are singular")]
    Singular,

    #[error("invalid model config: {0}")]
    InvalidConfig(String),

    #[error("sampling failed: {0}")]
    Sampling(String),
}

/// Fit on cleaned rows, predict history plus `horizon_days` future days.
pub trait Forecaster: Send + Sync {
    fn name(&self) -> &str;

    fn forecast(&self, rows: &[TrainingRow], horizon_days: u32) -> Result<Forecast, ForecastError>;
}

/// Whether a seasonality is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityToggle {
    /// Decided from the history span and spacing.
    #[default]
    Auto,
    On,
    Off,
}

/// Model hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_changepoints: usize,
    /// Fraction of history in which changepoints may be placed.
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub yearly: SeasonalityToggle,
    pub weekly: SeasonalityToggle,
    pub yearly_order: usize,
    pub weekly_order: usize,
    pub interval_width: f64,
    /// 0 disables sampling; bounds then equal the point estimate.
    pub uncertainty_samples: usize,
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly: SeasonalityToggle::Auto,
            weekly: SeasonalityToggle::Auto,
            yearly_order: 10,
            weekly_order: 3,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 42,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ForecastError> {
        let invalid = |msg: String| Err(ForecastError::InvalidConfig(msg));
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return invalid(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            ));
        }
        if !(self.changepoint_prior_scale > 0.0 && self.changepoint_prior_scale.is_finite()) {
            return invalid("changepoint_prior_scale must be positive".into());
        }
        if !(self.seasonality_prior_scale > 0.0 && self.seasonality_prior_scale.is_finite()) {
            return invalid("seasonality_prior_scale must be positive".into());
        }
        if self.yearly_order == 0 || self.weekly_order == 0 {
            return invalid("Fourier orders must be at least 1".into());
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return invalid(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_interval_width() {
        let cfg = ModelConfig {
            interval_width: 1.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ForecastError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_order() {
        let cfg = ModelConfig {
            weekly_order: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: ModelConfig = serde_json::from_str(r#"{"yearly":"off","seed":7}"#).unwrap();
        assert_eq!(cfg.yearly, SeasonalityToggle::Off);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.n_changepoints, 25);
    }
}
