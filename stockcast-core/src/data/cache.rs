//! Parquet price cache with Hive-style partitioning.
//!
//! Layout: `{cache_dir}/ticker={TICKER}/prices.parquet` plus a `meta.json`
//! sidecar recording the requested range, the observed range, a BLAKE3 hash
//! of the observations and when they were fetched.
//!
//! Writes go to a `.tmp` file that is renamed into place. A file that fails
//! to read or validate is renamed to `{file}.quarantined` and reported as a
//! cache miss.

use super::frame::{self, PRICE_COLUMNS};
use super::provider::{DataError, DataSource};
use crate::domain::{PriceObservation, Ticker};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const PRICES_FILE: &str = "prices.parquet";
const META_FILE: &str = "meta.json";

/// Metadata sidecar for a cached ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub ticker: Ticker,
    /// Range that was requested from the provider.
    pub requested_start: NaiveDate,
    pub requested_end: NaiveDate,
    /// First and last observed trading days.
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub row_count: usize,
    pub data_hash: String,
    pub source: DataSource,
    pub cached_at: NaiveDateTime,
}

impl CacheMeta {
    /// Whether this entry can answer a request for `[start, end]` without
    /// asking the provider again.
    pub fn is_fresh_for(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.requested_start <= start && self.cached_at.date() >= end
    }
}

/// Cache status for a single ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub ticker: Ticker,
    pub cached: bool,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub row_count: Option<usize>,
    pub cached_at: Option<NaiveDateTime>,
}

/// BLAKE3 hash over observation dates and values.
pub fn observations_hash(observations: &[PriceObservation]) -> String {
    let mut hasher = blake3::Hasher::new();
    for obs in observations {
        hasher.update(obs.date.to_string().as_bytes());
        hasher.update(&obs.open.to_le_bytes());
        hasher.update(&obs.high.to_le_bytes());
        hasher.update(&obs.low.to_le_bytes());
        hasher.update(&obs.close.to_le_bytes());
        hasher.update(&obs.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// The Parquet cache.
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn ticker_dir(&self, ticker: &Ticker) -> PathBuf {
        self.cache_dir.join(format!("ticker={ticker}"))
    }

    fn prices_path(&self, ticker: &Ticker) -> PathBuf {
        self.ticker_dir(ticker).join(PRICES_FILE)
    }

    fn meta_path(&self, ticker: &Ticker) -> PathBuf {
        self.ticker_dir(ticker).join(META_FILE)
    }

    /// Replace the cached observations for a ticker.
    pub fn write(
        &self,
        ticker: &Ticker,
        observations: &[PriceObservation],
        requested: (NaiveDate, NaiveDate),
        source: DataSource,
    ) -> Result<CacheMeta, DataError> {
        let (Some(first), Some(last)) = (observations.first(), observations.last()) else {
            return Err(DataError::CacheError("no observations to cache".into()));
        };

        let dir = self.ticker_dir(ticker);
        fs::create_dir_all(&dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let mut df = frame::frame_from_observations(observations)
            .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))?;
        let path = self.prices_path(ticker);
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&mut df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            ticker: ticker.clone(),
            requested_start: requested.0,
            requested_end: requested.1,
            first_date: first.date,
            last_date: last.date,
            row_count: observations.len(),
            data_hash: observations_hash(observations),
            source,
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(ticker), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        tracing::debug!(%ticker, rows = meta.row_count, path = %path.display(), "cached prices");
        Ok(meta)
    }

    /// Load cached observations inside `[start, end]`, ascending by date.
    pub fn load(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceObservation>, DataError> {
        let path = self.prices_path(ticker);
        if !path.exists() {
            return Err(DataError::NoCachedData {
                symbol: ticker.to_string(),
            });
        }

        let expected_rows = self.get_meta(ticker).map(|m| m.row_count);
        let all = match load_and_validate_parquet(&path, expected_rows) {
            Ok(all) => all,
            Err(e) => {
                let quarantine = path.with_extension("parquet.quarantined");
                tracing::warn!(path = %path.display(), error = %e, "quarantining corrupt cache file");
                let _ = fs::rename(&path, &quarantine);
                let _ = fs::remove_file(self.meta_path(ticker));
                return Err(DataError::NoCachedData {
                    symbol: ticker.to_string(),
                });
            }
        };

        Ok(all
            .into_iter()
            .filter(|o| o.date >= start && o.date <= end)
            .collect())
    }

    pub fn get_meta(&self, ticker: &Ticker) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(ticker)).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn status(&self, tickers: &[Ticker]) -> Vec<CacheStatus> {
        tickers
            .iter()
            .map(|ticker| {
                let meta = self.get_meta(ticker);
                CacheStatus {
                    ticker: ticker.clone(),
                    cached: meta.is_some(),
                    first_date: meta.as_ref().map(|m| m.first_date),
                    last_date: meta.as_ref().map(|m| m.last_date),
                    row_count: meta.as_ref().map(|m| m.row_count),
                    cached_at: meta.as_ref().map(|m| m.cached_at),
                }
            })
            .collect()
    }

    /// Tickers that have a metadata sidecar, sorted.
    pub fn cached_tickers(&self) -> Vec<Ticker> {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        let mut tickers: Vec<Ticker> = entries
            .filter_map(Result::ok)
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                let symbol = name.strip_prefix("ticker=")?;
                Ticker::parse(symbol).ok()
            })
            .filter(|t| self.meta_path(t).exists())
            .collect();
        tickers.sort();
        tickers
    }

    /// Remove everything cached for a ticker.
    pub fn remove(&self, ticker: &Ticker) -> Result<(), DataError> {
        let dir = self.ticker_dir(ticker);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .map_err(|e| DataError::CacheError(format!("remove {}: {e}", dir.display())))?;
        }
        Ok(())
    }
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(
    path: &Path,
    expected_rows: Option<usize>,
) -> Result<Vec<PriceObservation>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::CacheError("empty parquet file".into()));
    }
    for name in PRICE_COLUMNS {
        if df.column(name).is_err() {
            return Err(DataError::CacheError(format!("missing column '{name}'")));
        }
    }
    if let Some(expected) = expected_rows {
        if expected != df.height() {
            return Err(DataError::CacheError(format!(
                "row count {} does not match metadata ({expected})",
                df.height()
            )));
        }
    }

    frame::observations_from_frame(&df)
        .map_err(|e| DataError::ParquetError(format!("column read: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn aapl() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    fn sample() -> Vec<PriceObservation> {
        vec![
            PriceObservation {
                date: d(2024, 1, 2),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0,
                volume: 1000,
            },
            PriceObservation {
                date: d(2024, 1, 3),
                open: 101.0,
                high: 103.0,
                low: 100.0,
                close: 102.0,
                volume: 1100,
            },
        ]
    }

    fn write_sample(cache: &ParquetCache) -> CacheMeta {
        cache
            .write(&aapl(), &sample(), (d(2024, 1, 1), d(2024, 1, 3)), DataSource::YahooFinance)
            .unwrap()
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        write_sample(&cache);

        let loaded = cache.load(&aapl(), d(2024, 1, 1), d(2024, 12, 31)).unwrap();
        assert_eq!(loaded, sample());

        let one = cache.load(&aapl(), d(2024, 1, 3), d(2024, 1, 3)).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].close, 102.0);
    }

    #[test]
    fn load_missing_ticker_is_no_cached_data() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let result = cache.load(&aapl(), d(2024, 1, 1), d(2024, 1, 2));
        assert!(matches!(result, Err(DataError::NoCachedData { .. })));
    }

    #[test]
    fn empty_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let result = cache.write(&aapl(), &[], (d(2024, 1, 1), d(2024, 1, 2)), DataSource::Cache);
        assert!(matches!(result, Err(DataError::CacheError(_))));
    }

    #[test]
    fn meta_records_ranges_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let written = write_sample(&cache);
        let meta = cache.get_meta(&aapl()).unwrap();

        assert_eq!(meta, written);
        assert_eq!(meta.row_count, 2);
        assert_eq!(meta.requested_start, d(2024, 1, 1));
        assert_eq!(meta.first_date, d(2024, 1, 2));
        assert_eq!(meta.data_hash, observations_hash(&sample()));
        assert!(dir.path().join("ticker=AAPL").join("prices.parquet").exists());
    }

    #[test]
    fn freshness_uses_requested_start_and_fetch_date() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let mut meta = write_sample(&cache);
        meta.cached_at = d(2024, 1, 10).and_hms_opt(9, 0, 0).unwrap();

        assert!(meta.is_fresh_for(d(2024, 1, 1), d(2024, 1, 10)));
        assert!(!meta.is_fresh_for(d(2023, 12, 31), d(2024, 1, 10)));
        assert!(!meta.is_fresh_for(d(2024, 1, 1), d(2024, 1, 11)));
    }

    #[test]
    fn corrupt_file_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        write_sample(&cache);
        let path = dir.path().join("ticker=AAPL").join("prices.parquet");
        fs::write(&path, b"not parquet").unwrap();

        let result = cache.load(&aapl(), d(2024, 1, 1), d(2024, 1, 3));
        assert!(matches!(result, Err(DataError::NoCachedData { .. })));
        assert!(!path.exists());
        assert!(path.with_extension("parquet.quarantined").exists());
        assert!(cache.get_meta(&aapl()).is_none());
    }

    #[test]
    fn status_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        write_sample(&cache);
        let other = Ticker::parse("MSFT").unwrap();

        let statuses = cache.status(&[aapl(), other.clone()]);
        assert!(statuses[0].cached);
        assert_eq!(statuses[0].row_count, Some(2));
        assert!(!statuses[1].cached);

        assert_eq!(cache.cached_tickers(), vec![aapl()]);
        cache.remove(&aapl()).unwrap();
        assert!(cache.cached_tickers().is_empty());
        cache.remove(&other).unwrap();
    }
}
