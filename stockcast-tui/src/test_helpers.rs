//! Test helpers: an `AppState` wired to a scripted provider.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use stockcast_core::data::{DataError, DataProvider, DataSource, FetchResult, ParquetCache};
use stockcast_core::domain::{HorizonBounds, PriceObservation, Ticker, TickerSet};
use stockcast_core::forecast::{AdditiveForecaster, ModelConfig};
use stockcast_runner::Pipeline;

use crate::app::AppState;

#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Prices,
    Empty,
    Down,
}

struct ScriptedProvider(Reply);

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let observations = match self.0 {
            Reply::Down => return Err(DataError::NetworkUnreachable("offline".into())),
            Reply::Empty => Vec::new(),
            Reply::Prices => (0..120u64)
                .map(|i| {
                    let close = 100.0 + i as f64 * 0.5;
                    PriceObservation {
                        date: start + Days::new(i),
                        open: close - 1.0,
                        high: close + 1.0,
                        low: close - 2.0,
                        close,
                        volume: 1_000,
                    }
                })
                .collect(),
        };
        Ok(FetchResult {
            ticker: ticker.clone(),
            observations,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Fresh app over a temporary cache. Keep the `TempDir` alive for the test.
pub fn app_with(reply: Reply) -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let forecaster = AdditiveForecaster::new(ModelConfig {
        uncertainty_samples: 20,
        ..Default::default()
    })
    .unwrap();
    let pipeline = Pipeline::new(
        ParquetCache::new(dir.path().join("cache")),
        Some(Arc::new(ScriptedProvider(reply))),
        Arc::new(forecaster),
    );
    let range = (
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
    );
    let app = AppState::new(
        pipeline,
        TickerSet::default(),
        HorizonBounds::default(),
        range,
        dir.path().join("state.json"),
    );
    (app, dir)
}
