//! Price loading and data resolution for the runner.
//!
//! Implements the fallback policy for one ticker and date range:
//! 1. Fresh cache (fetched on/after `end`, covering `start`) → use it
//! 2. Offline → any cached data, else fail with a clear error
//! 3. Otherwise fetch from the provider and write through to the cache
//! 4. Provider failed but stale cached data exists → use it, with a warning
//!
//! An empty provider result is returned as-is (empty observations); deciding
//! that "no data" is fatal belongs to the pipeline.

use chrono::NaiveDate;
use stockcast_core::data::{
    observations_hash, DataError, DataProvider, DataSource, ParquetCache,
};
use stockcast_core::domain::{PriceObservation, Ticker};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no cached data for '{symbol}' and offline mode is on (run `stockcast download {symbol}` first)")]
    NoCachedDataOffline { symbol: String },

    #[error("no cached data for '{symbol}' and no data provider configured")]
    NoProvider { symbol: String },

    #[error("failed to load '{symbol}': {source}")]
    Fetch {
        symbol: String,
        #[source]
        source: DataError,
    },
}

impl LoadError {
    /// The provider reported the symbol as unknown.
    pub fn is_symbol_not_found(&self) -> bool {
        matches!(
            self,
            LoadError::Fetch {
                source: DataError::SymbolNotFound { .. },
                ..
            }
        )
    }
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Never make network requests.
    pub offline: bool,
    /// Skip the fresh-cache shortcut and re-fetch.
    pub force: bool,
}

/// Loaded observations with provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPrices {
    pub observations: Vec<PriceObservation>,
    pub source: DataSource,
    /// BLAKE3 over the observations (see `observations_hash`).
    pub dataset_hash: String,
}

impl LoadedPrices {
    fn new(observations: Vec<PriceObservation>, source: DataSource) -> Self {
        let dataset_hash = observations_hash(&observations);
        Self {
            observations,
            source,
            dataset_hash,
        }
    }
}

/// Load daily observations for `ticker` inside `[start, end]`.
pub fn load_prices(
    ticker: &Ticker,
    start: NaiveDate,
    end: NaiveDate,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    opts: LoadOptions,
) -> Result<LoadedPrices, LoadError> {
    let symbol = ticker.to_string();

    // Step 1: fresh cache
    if !opts.force {
        let fresh = cache
            .get_meta(ticker)
            .is_some_and(|meta| meta.is_fresh_for(start, end));
        if fresh {
            if let Ok(observations) = cache.load(ticker, start, end) {
                tracing::debug!(%ticker, rows = observations.len(), "using fresh cache");
                return Ok(LoadedPrices::new(observations, DataSource::Cache));
            }
        }
    }

    // Step 2: offline
    if opts.offline {
        return match cache.load(ticker, start, end) {
            Ok(observations) => {
                tracing::info!(%ticker, rows = observations.len(), "offline: using cached data");
                Ok(LoadedPrices::new(observations, DataSource::Cache))
            }
            Err(_) => Err(LoadError::NoCachedDataOffline { symbol }),
        };
    }

    let Some(provider) = provider else {
        return cache
            .load(ticker, start, end)
            .map(|observations| LoadedPrices::new(observations, DataSource::Cache))
            .map_err(|_| LoadError::NoProvider { symbol });
    };

    // Step 3: fetch and write through
    let fetch_err = match provider.fetch(ticker, start, end) {
        Ok(fetched) => {
            if fetched.observations.is_empty() {
                tracing::warn!(%ticker, provider = provider.name(), "provider returned no rows");
                return Ok(LoadedPrices::new(Vec::new(), fetched.source));
            }
            if let Err(e) = cache.write(ticker, &fetched.observations, (start, end), fetched.source)
            {
                tracing::warn!(%ticker, error = %e, "failed to write price cache");
            }
            tracing::info!(
                %ticker,
                rows = fetched.observations.len(),
                source = fetched.source.label(),
                "fetched prices"
            );
            return Ok(LoadedPrices::new(fetched.observations, fetched.source));
        }
        Err(e) => e,
    };

    // Step 4: stale fallback. An unknown symbol is never served from cache.
    if !matches!(fetch_err, DataError::SymbolNotFound { .. }) {
        if let Ok(observations) = cache.load(ticker, start, end) {
            if !observations.is_empty() {
                tracing::warn!(
                    %ticker,
                    error = %fetch_err,
                    rows = observations.len(),
                    "fetch failed; using stale cached data"
                );
                return Ok(LoadedPrices::new(observations, DataSource::Cache));
            }
        }
    }

    Err(LoadError::Fetch {
        symbol,
        source: fetch_err,
    })
}
