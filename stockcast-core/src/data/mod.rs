//! Price data: providers, the Parquet cache and the training-data cleaner.

pub mod cache;
pub mod circuit_breaker;
pub mod cleaner;
pub mod csv_import;
pub mod download;
pub mod frame;
pub mod provider;
pub mod yahoo;

pub use cache::{observations_hash, CacheMeta, CacheStatus, ParquetCache};
pub use circuit_breaker::CircuitBreaker;
pub use cleaner::{
    clean_observations, clean_training_frame, clean_training_frame_with, training_rows,
    training_rows_with, CleanError, CleanerColumns,
};
pub use csv_import::CsvProvider;
pub use download::{download_tickers, DownloadSummary};
pub use frame::{frame_from_observations, observations_from_frame};
pub use provider::{DataError, DataProvider, DataSource, DownloadProgress, FetchResult, StdoutProgress};
pub use yahoo::YahooProvider;
