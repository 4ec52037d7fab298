//! Results memo for the pipeline.
//!
//! Two layers, both bounded and evicting oldest-first:
//! - prices, keyed by `(ticker, start, end)`
//! - forecasts, keyed by `(dataset_hash, horizon_days)`
//!
//! Memoization never changes results; it only skips recomputation of
//! identical inputs.

use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use stockcast_core::domain::{Forecast, Ticker};

use crate::data_loader::LoadedPrices;

/// Default number of entries kept per layer.
pub const DEFAULT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceKey {
    pub ticker: Ticker,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForecastKey {
    pub dataset_hash: String,
    pub horizon_days: u32,
}

/// Insertion-ordered map with a fixed capacity.
#[derive(Debug)]
struct Bounded<K, V> {
    capacity: usize,
    order: VecDeque<K>,
    entries: HashMap<K, Arc<V>>,
}

impl<K: Clone + Eq + Hash, V> Bounded<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: K, value: Arc<V>) {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.order.retain(|k| keep(k));
        let order = &self.order;
        self.entries.retain(|k, _| order.contains(k));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Memo shared by one `Pipeline`.
#[derive(Debug)]
pub struct ResultsMemo {
    prices: Mutex<Bounded<PriceKey, LoadedPrices>>,
    forecasts: Mutex<Bounded<ForecastKey, Forecast>>,
}

impl Default for ResultsMemo {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave a half-written entry
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ResultsMemo {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            prices: Mutex::new(Bounded::new(capacity)),
            forecasts: Mutex::new(Bounded::new(capacity)),
        }
    }

    pub fn prices(&self, key: &PriceKey) -> Option<Arc<LoadedPrices>> {
        lock(&self.prices).get(key)
    }

    pub fn store_prices(&self, key: PriceKey, prices: Arc<LoadedPrices>) {
        lock(&self.prices).insert(key, prices);
    }

    pub fn forecast(&self, key: &ForecastKey) -> Option<Arc<Forecast>> {
        lock(&self.forecasts).get(key)
    }

    pub fn store_forecast(&self, key: ForecastKey, forecast: Arc<Forecast>) {
        lock(&self.forecasts).insert(key, forecast);
    }

    /// Drop memoized prices for `ticker`.
    ///
    /// Forecasts are keyed by dataset hash, so a refreshed series with new
    /// data misses them naturally; an unchanged series keeps its forecast.
    pub fn invalidate(&self, ticker: &Ticker) {
        lock(&self.prices).retain(|k| &k.ticker != ticker);
    }

    pub fn clear(&self) {
        lock(&self.prices).retain(|_| false);
        lock(&self.forecasts).retain(|_| false);
    }

    /// `(price entries, forecast entries)`.
    pub fn len(&self) -> (usize, usize) {
        (lock(&self.prices).len(), lock(&self.forecasts).len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::data::DataSource;

    fn key(symbol: &str) -> PriceKey {
        PriceKey {
            ticker: Ticker::parse(symbol).unwrap(),
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        }
    }

    fn prices() -> Arc<LoadedPrices> {
        Arc::new(LoadedPrices {
            observations: Vec::new(),
            source: DataSource::Cache,
            dataset_hash: "h".into(),
        })
    }

    #[test]
    fn evicts_oldest_first() {
        let memo = ResultsMemo::with_capacity(2);
        memo.store_prices(key("AAPL"), prices());
        memo.store_prices(key("GOOG"), prices());
        memo.store_prices(key("MSFT"), prices());
        assert!(memo.prices(&key("AAPL")).is_none());
        assert!(memo.prices(&key("GOOG")).is_some());
        assert!(memo.prices(&key("MSFT")).is_some());
        assert_eq!(memo.len(), (2, 0));
    }

    #[test]
    fn reinsert_does_not_duplicate() {
        let memo = ResultsMemo::with_capacity(2);
        memo.store_prices(key("AAPL"), prices());
        memo.store_prices(key("AAPL"), prices());
        memo.store_prices(key("GOOG"), prices());
        assert!(memo.prices(&key("AAPL")).is_some());
    }

    #[test]
    fn invalidate_only_touches_one_ticker() {
        let memo = ResultsMemo::default();
        memo.store_prices(key("AAPL"), prices());
        memo.store_prices(key("TSLA"), prices());
        memo.store_forecast(
            ForecastKey {
                dataset_hash: "h".into(),
                horizon_days: 365,
            },
            Arc::new(Forecast::default()),
        );
        memo.invalidate(&Ticker::parse("AAPL").unwrap());
        assert!(memo.prices(&key("AAPL")).is_none());
        assert!(memo.prices(&key("TSLA")).is_some());
        assert_eq!(memo.len(), (1, 1));

        memo.clear();
        assert_eq!(memo.len(), (0, 0));
    }
}
