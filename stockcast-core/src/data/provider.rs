//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over price sources (Yahoo Finance, CSV
//! import) so the pipeline can swap implementations and tests can mock them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceObservation, Ticker};

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("csv import error: {0}")]
    CsvError(String),

    #[error("no cached data for '{symbol}'; run `stockcast download {symbol}` first")]
    NoCachedData { symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single ticker.
///
/// `observations` may be empty: the provider answered but had nothing in the
/// requested range. Callers decide whether that is an error.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub ticker: Ticker,
    pub observations: Vec<PriceObservation>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Cache,
}

impl DataSource {
    pub fn label(self) -> &'static str {
        match self {
            DataSource::YahooFinance => "yahoo",
            DataSource::CsvImport => "csv",
            DataSource::Cache => "cache",
        }
    }
}

/// Trait for price providers.
///
/// The cache layer sits above this trait; providers don't know about it.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily observations for a ticker over an inclusive date range,
    /// ascending by date.
    fn fetch(&self, ticker: &Ticker, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Progress callback for multi-ticker downloads.
pub trait DownloadProgress {
    fn on_start(&self, ticker: &Ticker, index: usize, total: usize);

    fn on_complete(&self, ticker: &Ticker, rows: Result<usize, &DataError>);

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, ticker: &Ticker, index: usize, total: usize) {
        println!("[{}/{}] Fetching {ticker}...", index + 1, total);
    }

    fn on_complete(&self, ticker: &Ticker, rows: Result<usize, &DataError>) {
        match rows {
            Ok(n) => println!("  OK: {ticker} ({n} rows)"),
            Err(e) => println!("  FAIL: {ticker}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nDownload complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}
