//! Stockcast Core: domain types, price data, cleaning and forecasting.
//!
//! This crate contains everything below the pipeline:
//! - Domain types (observations, training rows, forecasts, tickers, horizons)
//! - Price providers (Yahoo Finance, CSV import) behind the `DataProvider` trait
//! - The Parquet price cache
//! - The training-data cleaner (polars)
//! - The additive trend + seasonality forecaster behind the `Forecaster` trait

pub mod data;
pub mod domain;
pub mod forecast;
pub mod rng;
