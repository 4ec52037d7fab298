//! Stockcast Runner: pipeline orchestration on top of `stockcast-core`.
//!
//! This crate provides:
//! - Configuration (`stockcast.toml`)
//! - Price loading with cache/fetch/stale fallback
//! - The pipeline: load → validate → clean → validate → forecast
//! - A results memo keyed by input parameters
//! - Tail tables and CSV/JSON forecast export

pub mod config;
pub mod data_loader;
pub mod memo;
pub mod pipeline;
pub mod report;

pub use config::{AppConfig, ConfigError, DEFAULT_CONFIG_FILE};
pub use data_loader::{load_prices, LoadError, LoadOptions, LoadedPrices};
pub use memo::{ForecastKey, PriceKey, ResultsMemo};
pub use pipeline::{Pipeline, PipelineError, PipelineOutput, PipelineRequest, SetupError};
pub use report::{
    export_forecast_csv, export_json, forecast_tail_table, import_json, raw_tail_table,
    save_forecast, ExportFormat, ForecastReport, TAIL_ROWS,
};
