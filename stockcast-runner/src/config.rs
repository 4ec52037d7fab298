//! Application configuration (`stockcast.toml`).
//!
//! Every field has a default, so an empty file or no file at all is a valid
//! configuration:
//!
//! ```toml
//! [data]
//! start = "2015-01-01"
//! cache_dir = "data"
//! offline = false
//!
//! [tickers]
//! symbols = ["AAPL", "GOOG", "NFLX", "TSLA", "MSFT", "META", "AMZN"]
//! min_years = 1
//! max_years = 4
//!
//! [model]
//! interval_width = 0.8
//! uncertainty_samples = 1000
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stockcast_core::domain::{HorizonBounds, TickerError, TickerSet, DEFAULT_TICKERS};
use stockcast_core::forecast::{ForecastError, ModelConfig};
use thiserror::Error;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "stockcast.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid ticker settings: {0}")]
    Tickers(#[from] TickerError),

    #[error("invalid model settings: {0}")]
    Model(#[from] ForecastError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// First day of history to download.
    pub start: NaiveDate,
    /// Last day of history; today when unset.
    pub end: Option<NaiveDate>,
    pub cache_dir: PathBuf,
    /// Never touch the network; serve from cache only.
    pub offline: bool,
    /// Import `{TICKER}.csv` files from this directory instead of Yahoo.
    pub csv_dir: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
            end: None,
            cache_dir: PathBuf::from("data"),
            offline: false,
            csv_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    pub symbols: Vec<String>,
    pub min_years: u32,
    pub max_years: u32,
}

impl Default for TickerConfig {
    fn default() -> Self {
        let bounds = HorizonBounds::default();
        Self {
            symbols: DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect(),
            min_years: bounds.min_years,
            max_years: bounds.max_years,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub tickers: TickerConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path`, else `./stockcast.toml` if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    tracing::info!(path = %default_path.display(), "loading config");
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(end) = self.data.end {
            if self.data.start >= end {
                return Err(ConfigError::Invalid(format!(
                    "data.start ({}) must be before data.end ({end})",
                    self.data.start
                )));
            }
        }
        self.ticker_set()?;
        self.horizon_bounds()?;
        self.model.validate()?;
        Ok(())
    }

    pub fn ticker_set(&self) -> Result<TickerSet, TickerError> {
        TickerSet::new(&self.tickers.symbols)
    }

    pub fn horizon_bounds(&self) -> Result<HorizonBounds, TickerError> {
        HorizonBounds::new(self.tickers.min_years, self.tickers.max_years)
    }

    /// Configured end date, or `today`.
    pub fn end_date(&self, today: NaiveDate) -> NaiveDate {
        self.data.end.unwrap_or(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::forecast::SeasonalityToggle;

    #[test]
    fn empty_file_is_default() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.ticker_set().unwrap().len(), 7);
        assert_eq!(config.data.start, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
    }

    #[test]
    fn partial_sections_override() {
        let config = AppConfig::from_toml(
            r#"
[data]
start = "2018-06-01"
end = "2024-06-01"
offline = true

[tickers]
symbols = ["msft", "nflx"]
max_years = 2

[model]
weekly = "off"
uncertainty_samples = 0
"#,
        )
        .unwrap();
        assert!(config.data.offline);
        assert_eq!(config.data.cache_dir, PathBuf::from("data"));
        assert_eq!(config.ticker_set().unwrap().tickers()[0].as_str(), "MSFT");
        assert_eq!(config.horizon_bounds().unwrap().max_years, 2);
        assert_eq!(config.model.weekly, SeasonalityToggle::Off);
        assert_eq!(config.model.n_changepoints, 25);
        assert_eq!(
            config.end_date(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }

    #[test]
    fn rejects_inverted_dates() {
        let err = AppConfig::from_toml("[data]\nstart = \"2024-01-01\"\nend = \"2023-01-01\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_ticker_set() {
        let err = AppConfig::from_toml("[tickers]\nsymbols = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Tickers(TickerError::EmptySet)));
    }

    #[test]
    fn rejects_bad_horizon_and_width() {
        assert!(AppConfig::from_toml("[tickers]\nmin_years = 5\nmax_years = 4\n").is_err());
        assert!(matches!(
            AppConfig::from_toml("[model]\ninterval_width = 1.5\n").unwrap_err(),
            ConfigError::Model(_)
        ));
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = AppConfig::from_file(Path::new("/nonexistent/stockcast.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
