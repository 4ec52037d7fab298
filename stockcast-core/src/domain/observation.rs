//! PriceObservation: one trading day of market data for one ticker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV observation as delivered by a data provider.
///
/// Missing prices are NaN and a missing volume is 0. Observations are never
/// mutated after they are fetched; cleaning produces new rows instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceObservation {
    /// Returns true if every price field is NaN (holiday or provider gap).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() && self.high.is_nan() && self.low.is_nan() && self.close.is_nan()
    }

    /// True when the close price can feed the forecaster.
    pub fn has_close(&self) -> bool {
        self.close.is_finite()
    }

    /// Basic OHLC sanity: high is the max, low is the min, prices positive.
    pub fn is_sane(&self) -> bool {
        if [self.open, self.high, self.low, self.close]
            .iter()
            .any(|v| !v.is_finite())
        {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PriceObservation {
        PriceObservation {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 185.0,
            high: 188.4,
            low: 183.9,
            close: 185.6,
            volume: 82_488_700,
        }
    }

    #[test]
    fn sane_observation() {
        let obs = sample();
        assert!(obs.is_sane());
        assert!(obs.has_close());
        assert!(!obs.is_void());
    }

    #[test]
    fn missing_close_is_not_usable() {
        let mut obs = sample();
        obs.close = f64::NAN;
        assert!(!obs.has_close());
        assert!(!obs.is_sane());
        assert!(!obs.is_void());
    }

    #[test]
    fn void_when_all_prices_missing() {
        let mut obs = sample();
        obs.open = f64::NAN;
        obs.high = f64::NAN;
        obs.low = f64::NAN;
        obs.close = f64::NAN;
        assert!(obs.is_void());
    }

    #[test]
    fn inverted_high_low_is_insane() {
        let mut obs = sample();
        obs.high = 180.0;
        assert!(!obs.is_sane());
    }
}
