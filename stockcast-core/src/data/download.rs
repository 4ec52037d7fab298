//! Multi-ticker download with progress reporting.

use super::cache::ParquetCache;
use super::provider::{DataError, DataProvider, DownloadProgress};
use crate::domain::Ticker;
use chrono::NaiveDate;

/// Summary of a batch download.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(Ticker, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Fetch and cache each ticker in turn.
///
/// Fresh cache entries are skipped unless `force` is set. An empty fetch
/// counts as a failure (`SymbolNotFound`). Once the provider stops being
/// available the remaining tickers are failed without a request.
pub fn download_tickers(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    tickers: &[Ticker],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = tickers.len();
    let mut succeeded = 0;
    let mut errors: Vec<(Ticker, DataError)> = Vec::new();

    for (i, ticker) in tickers.iter().enumerate() {
        progress.on_start(ticker, i, total);

        if !force {
            if let Some(meta) = cache.get_meta(ticker).filter(|m| m.is_fresh_for(start, end)) {
                progress.on_complete(ticker, Ok(meta.row_count));
                succeeded += 1;
                continue;
            }
        }

        let result = download_single(provider, cache, ticker, start, end);
        progress.on_complete(ticker, result.as_ref().map(|n| *n));
        match result {
            Ok(_) => succeeded += 1,
            Err(e) => errors.push((ticker.clone(), e)),
        }

        if !provider.is_available() {
            for rest in &tickers[(i + 1)..] {
                errors.push((rest.clone(), DataError::CircuitBreakerTripped));
            }
            break;
        }
    }

    let failed = errors.len();
    progress.on_batch_complete(succeeded, failed, total);
    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

fn download_single(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    ticker: &Ticker,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<usize, DataError> {
    let fetched = provider.fetch(ticker, start, end)?;
    if fetched.observations.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: ticker.to_string(),
        });
    }
    let meta = cache.write(ticker, &fetched.observations, (start, end), fetched.source)?;
    Ok(meta.row_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{DataSource, FetchResult};
    use crate::domain::PriceObservation;
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        calls: AtomicUsize,
    }

    impl DataProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn fetch(
            &self,
            ticker: &Ticker,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let observations = if ticker.as_str() == "EMPTY" {
                Vec::new()
            } else {
                vec![PriceObservation {
                    date: start,
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: 10,
                }]
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

    #[derive(Default)]
    struct Recorder {
        batch: RefCell<Option<(usize, usize, usize)>>,
    }

    impl DownloadProgress for Recorder {
        fn on_start(&self, _: &Ticker, _: usize, _: usize) {}
        fn on_complete(&self, _: &Ticker, _: Result<usize, &DataError>) {}
        fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
            *self.batch.borrow_mut() = Some((succeeded, failed, total));
        }
    }

    #[test]
    fn downloads_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let provider = FakeProvider {
            calls: AtomicUsize::new(0),
        };
        let recorder = Recorder::default();
        let tickers = vec![Ticker::parse("AAPL").unwrap(), Ticker::parse("EMPTY").unwrap()];
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let summary = download_tickers(&provider, &cache, &tickers, day, day, false, &recorder);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(matches!(summary.errors[0].1, DataError::SymbolNotFound { .. }));
        assert_eq!(*recorder.batch.borrow(), Some((1, 1, 2)));
        assert!(cache.get_meta(&tickers[0]).is_some());

        // Cached today for a past range: fresh, no second request for AAPL
        let before = provider.calls.load(Ordering::SeqCst);
        download_tickers(&provider, &cache, &tickers[..1], day, day, false, &recorder);
        assert_eq!(provider.calls.load(Ordering::SeqCst), before);

        download_tickers(&provider, &cache, &tickers[..1], day, day, true, &recorder);
        assert_eq!(provider.calls.load(Ordering::SeqCst), before + 1);
    }
}
