//! Tickers, the enumerated ticker set, and the forecast horizon.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Tickers offered when no config overrides the set.
pub const DEFAULT_TICKERS: [&str; 7] = ["AAPL", "GOOG", "NFLX", "TSLA", "MSFT", "META", "AMZN"];

/// Calendar days per horizon year.
pub const DAYS_PER_YEAR: u32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("invalid ticker '{0}': expected 1-10 characters of A-Z, 0-9, '.', '-' or '^'")]
    Malformed(String),

    #[error("ticker '{ticker}' is not in the configured set ({allowed})")]
    NotInSet { ticker: String, allowed: String },

    #[error("ticker set is empty")]
    EmptySet,

    #[error("horizon of {years} years is outside {min}..={max}")]
    HorizonOutOfRange { years: u32, min: u32, max: u32 },

    #[error("horizon bounds {min}..={max} are invalid")]
    InvalidHorizonBounds { min: u32, max: u32 },
}

/// Validated, upper-cased ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, TickerError> {
        let symbol = raw.trim().to_ascii_uppercase();
        let valid = !symbol.is_empty()
            && symbol.len() <= 10
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'));
        if !valid {
            return Err(TickerError::Malformed(raw.to_string()));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ticker::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(t: Ticker) -> Self {
        t.0
    }
}

/// The fixed, ordered set of tickers a user may pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSet {
    tickers: Vec<Ticker>,
}

impl TickerSet {
    /// Build a set from raw symbols, dropping duplicates while keeping order.
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Result<Self, TickerError> {
        let mut tickers: Vec<Ticker> = Vec::with_capacity(symbols.len());
        for s in symbols {
            let t = Ticker::parse(s.as_ref())?;
            if !tickers.contains(&t) {
                tickers.push(t);
            }
        }
        if tickers.is_empty() {
            return Err(TickerError::EmptySet);
        }
        Ok(Self { tickers })
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Ticker> {
        self.tickers.get(index)
    }

    pub fn position(&self, ticker: &Ticker) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    /// Resolve a raw symbol against the set.
    pub fn resolve(&self, raw: &str) -> Result<Ticker, TickerError> {
        let ticker = Ticker::parse(raw)?;
        if self.tickers.contains(&ticker) {
            Ok(ticker)
        } else {
            Err(TickerError::NotInSet {
                ticker: ticker.0,
                allowed: self
                    .tickers
                    .iter()
                    .map(Ticker::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }
}

impl Default for TickerSet {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS
                .iter()
                .map(|s| Ticker(s.to_string()))
                .collect(),
        }
    }
}

/// Inclusive bounds on the horizon slider, in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonBounds {
    pub min_years: u32,
    pub max_years: u32,
}

impl HorizonBounds {
    pub fn new(min_years: u32, max_years: u32) -> Result<Self, TickerError> {
        if min_years == 0 || min_years > max_years {
            return Err(TickerError::InvalidHorizonBounds {
                min: min_years,
                max: max_years,
            });
        }
        Ok(Self {
            min_years,
            max_years,
        })
    }

    pub fn range(&self) -> RangeInclusive<u32> {
        self.min_years..=self.max_years
    }

    pub fn clamp(&self, years: u32) -> u32 {
        years.clamp(self.min_years, self.max_years)
    }
}

impl Default for HorizonBounds {
    fn default() -> Self {
        Self {
            min_years: 1,
            max_years: 4,
        }
    }
}

/// Forecast horizon in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Horizon {
    years: u32,
}

impl Horizon {
    pub fn new(years: u32, bounds: HorizonBounds) -> Result<Self, TickerError> {
        if !bounds.range().contains(&years) {
            return Err(TickerError::HorizonOutOfRange {
                years,
                min: bounds.min_years,
                max: bounds.max_years,
            });
        }
        Ok(Self { years })
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    /// Horizon length in calendar days.
    pub fn days(&self) -> u32 {
        self.years * DAYS_PER_YEAR
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.years == 1 {
            write!(f, "1 year")
        } else {
            write!(f, "{} years", self.years)
        }
    }
}
