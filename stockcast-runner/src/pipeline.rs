//! Pipeline orchestration: load → validate → clean → validate → forecast.
//!
//! Every validation step is a hard stop. A failed run returns an error and
//! nothing else; there is no partial output to render.

use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use stockcast_core::data::{
    frame_from_observations, training_rows_with, CircuitBreaker, CleanError, CleanerColumns,
    CsvProvider, DataError, DataProvider, DataSource, ParquetCache, YahooProvider,
};
use stockcast_core::domain::{Forecast, Horizon, PriceObservation, Ticker, TrainingRow};
use stockcast_core::forecast::{AdditiveForecaster, ForecastError, Forecaster};

use crate::config::AppConfig;
use crate::data_loader::{load_prices, LoadError, LoadOptions, LoadedPrices};
use crate::memo::{ForecastKey, PriceKey, ResultsMemo};

/// Pipeline failures, each terminal for the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no data found for '{ticker}' in the requested date range")]
    NoDataFound { ticker: Ticker },

    #[error("failed to prepare data for '{ticker}': {source}")]
    DataPreparationFailure {
        ticker: Ticker,
        #[source]
        source: CleanError,
    },

    #[error("no usable closing prices for '{ticker}' after cleaning")]
    EmptyAfterCleaning { ticker: Ticker },

    #[error(transparent)]
    FetchFailed(LoadError),

    #[error("forecast failed for '{ticker}': {source}")]
    ForecastFailed {
        ticker: Ticker,
        #[source]
        source: ForecastError,
    },
}

impl PipelineError {
    /// Short label for status lines and error history.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NoDataFound { .. } => "no data",
            PipelineError::DataPreparationFailure { .. } => "preparation",
            PipelineError::EmptyAfterCleaning { .. } => "empty after cleaning",
            PipelineError::FetchFailed(_) => "fetch",
            PipelineError::ForecastFailed { .. } => "forecast",
        }
    }
}

/// Errors building a pipeline from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("data provider: {0}")]
    Provider(#[from] DataError),
    #[error("model: {0}")]
    Model(#[from] ForecastError),
}

/// One pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub ticker: Ticker,
    pub horizon: Horizon,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Everything a front-end needs to render one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub ticker: Ticker,
    pub horizon: Horizon,
    prices: Arc<LoadedPrices>,
    pub rows: Vec<TrainingRow>,
    pub forecast: Arc<Forecast>,
}

impl PipelineOutput {
    pub fn observations(&self) -> &[PriceObservation] {
        &self.prices.observations
    }

    pub fn source(&self) -> DataSource {
        self.prices.source
    }

    pub fn dataset_hash(&self) -> &str {
        &self.prices.dataset_hash
    }

    /// Last `n` raw observations.
    pub fn raw_tail(&self, n: usize) -> &[PriceObservation] {
        let obs = self.observations();
        &obs[obs.len().saturating_sub(n)..]
    }
}

pub struct Pipeline {
    cache: ParquetCache,
    provider: Option<Arc<dyn DataProvider>>,
    forecaster: Arc<dyn Forecaster>,
    columns: CleanerColumns,
    load_options: LoadOptions,
    memo: ResultsMemo,
}

impl Pipeline {
    pub fn new(
        cache: ParquetCache,
        provider: Option<Arc<dyn DataProvider>>,
        forecaster: Arc<dyn Forecaster>,
    ) -> Self {
        Self {
            cache,
            provider,
            forecaster,
            columns: CleanerColumns::default(),
            load_options: LoadOptions::default(),
            memo: ResultsMemo::default(),
        }
    }

    /// Wire cache, provider and forecaster from configuration.
    ///
    /// `csv_dir` selects the CSV import provider; otherwise Yahoo Finance.
    /// Offline mode builds no provider at all.
    pub fn from_config(config: &AppConfig) -> Result<Self, SetupError> {
        let cache = ParquetCache::new(&config.data.cache_dir);
        let provider: Option<Arc<dyn DataProvider>> = if config.data.offline {
            None
        } else if let Some(dir) = &config.data.csv_dir {
            Some(Arc::new(CsvProvider::new(dir.clone())))
        } else {
            let breaker = Arc::new(CircuitBreaker::default_provider());
            Some(Arc::new(YahooProvider::new(breaker)?))
        };
        let forecaster = Arc::new(AdditiveForecaster::new(config.model.clone())?);

        Ok(Self::new(cache, provider, forecaster).with_load_options(LoadOptions {
            offline: config.data.offline,
            force: false,
        }))
    }

    /// Column names the cleaner reads from the observation frame.
    pub fn with_columns(mut self, columns: CleanerColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.memo = ResultsMemo::with_capacity(capacity);
        self
    }

    pub fn cache(&self) -> &ParquetCache {
        &self.cache
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache.cache_dir().to_path_buf()
    }

    pub fn forecaster_name(&self) -> &str {
        self.forecaster.name()
    }

    pub fn memo(&self) -> &ResultsMemo {
        &self.memo
    }

    /// Run the pipeline, reusing memoized prices and forecasts.
    pub fn run(&self, request: &PipelineRequest) -> Result<Arc<PipelineOutput>, PipelineError> {
        self.execute(request, self.load_options)
    }

    /// Drop memoized results for `request.ticker` and re-fetch.
    pub fn refresh(&self, request: &PipelineRequest) -> Result<Arc<PipelineOutput>, PipelineError> {
        self.invalidate(&request.ticker);
        let options = LoadOptions {
            force: !self.load_options.offline,
            ..self.load_options
        };
        self.execute(request, options)
    }

    pub fn invalidate(&self, ticker: &Ticker) {
        tracing::debug!(%ticker, "invalidating memoized results");
        self.memo.invalidate(ticker);
    }

    fn execute(
        &self,
        request: &PipelineRequest,
        options: LoadOptions,
    ) -> Result<Arc<PipelineOutput>, PipelineError> {
        let ticker = &request.ticker;
        let _span = tracing::info_span!("pipeline", %ticker, horizon = %request.horizon).entered();

        // Fetch
        let prices = self.prices(request, options)?;
        if prices.observations.is_empty() {
            return Err(PipelineError::NoDataFound {
                ticker: ticker.clone(),
            });
        }

        // Clean
        let rows = frame_from_observations(&prices.observations)
            .map_err(CleanError::from)
            .and_then(|df| training_rows_with(&df, &self.columns))
            .map_err(|source| PipelineError::DataPreparationFailure {
                ticker: ticker.clone(),
                source,
            })?;
        if rows.is_empty() {
            return Err(PipelineError::EmptyAfterCleaning {
                ticker: ticker.clone(),
            });
        }

        // Forecast
        let key = ForecastKey {
            dataset_hash: prices.dataset_hash.clone(),
            horizon_days: request.horizon.days(),
        };
        let forecast = match self.memo.forecast(&key) {
            Some(hit) => {
                tracing::debug!("forecast memo hit");
                hit
            }
            None => {
                let forecast = self
                    .forecaster
                    .forecast(&rows, request.horizon.days())
                    .map_err(|source| PipelineError::ForecastFailed {
                        ticker: ticker.clone(),
                        source,
                    })?;
                let forecast = Arc::new(forecast);
                self.memo.store_forecast(key, Arc::clone(&forecast));
                forecast
            }
        };

        tracing::info!(
            observations = prices.observations.len(),
            rows = rows.len(),
            forecast_rows = forecast.rows.len(),
            "pipeline complete"
        );

        Ok(Arc::new(PipelineOutput {
            ticker: ticker.clone(),
            horizon: request.horizon,
            prices,
            rows,
            forecast,
        }))
    }

    fn prices(
        &self,
        request: &PipelineRequest,
        options: LoadOptions,
    ) -> Result<Arc<LoadedPrices>, PipelineError> {
        let key = PriceKey {
            ticker: request.ticker.clone(),
            start: request.start,
            end: request.end,
        };
        if !options.force {
            if let Some(hit) = self.memo.prices(&key) {
                tracing::debug!("price memo hit");
                return Ok(hit);
            }
        }

        let loaded = load_prices(
            &request.ticker,
            request.start,
            request.end,
            &self.cache,
            self.provider.as_deref(),
            options,
        )
        .map_err(|e| {
            if e.is_symbol_not_found() {
                PipelineError::NoDataFound {
                    ticker: request.ticker.clone(),
                }
            } else {
                PipelineError::FetchFailed(e)
            }
        })?;

        let loaded = Arc::new(loaded);
        // Empty results are not memoized; the next run asks again
        if !loaded.observations.is_empty() {
            self.memo.store_prices(key, Arc::clone(&loaded));
        }
        Ok(loaded)
    }
}
