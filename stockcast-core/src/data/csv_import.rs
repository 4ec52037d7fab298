//! CSV import provider.
//!
//! Reads `{dir}/{TICKER}.csv` files in the layout Yahoo's download button
//! produces (`Date,Open,High,Low,Close,Adj Close,Volume`). Header matching is
//! case-insensitive and extra columns are ignored. Unparseable prices become
//! NaN so the cleaner decides what is usable.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{PriceObservation, Ticker};
use chrono::NaiveDate;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Offline provider backed by per-ticker CSV files.
pub struct CsvProvider {
    dir: PathBuf,
}

struct ColumnIndex {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Ok(Self {
            date: find("date").ok_or_else(|| DataError::CsvError("missing 'Date' column".into()))?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            close: find("close")
                .ok_or_else(|| DataError::CsvError("missing 'Close' column".into()))?,
            volume: find("volume"),
        })
    }
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, ticker: &Ticker) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    /// Parse CSV content, keeping rows inside `[start, end]`.
    pub fn parse<R: Read>(
        reader: R,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceObservation>, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| DataError::CsvError(format!("read header: {e}")))?
            .clone();
        let idx = ColumnIndex::from_headers(&headers)?;

        let mut observations = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| DataError::CsvError(format!("row {}: {e}", line + 2)))?;
            let raw_date = record.get(idx.date).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
                DataError::CsvError(format!("row {}: bad date '{raw_date}': {e}", line + 2))
            })?;
            if date < start || date > end {
                continue;
            }

            let price = |col: Option<usize>| {
                col.and_then(|c| record.get(c))
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .unwrap_or(f64::NAN)
            };
            observations.push(PriceObservation {
                date,
                open: price(idx.open),
                high: price(idx.high),
                low: price(idx.low),
                close: price(Some(idx.close)),
                volume: idx
                    .volume
                    .and_then(|c| record.get(c))
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .map(|v| v as u64)
                    .unwrap_or(0),
            });
        }

        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        let file = std::fs::File::open(&path)
            .map_err(|e| DataError::CsvError(format!("open {}: {e}", path.display())))?;
        let observations = Self::parse(file, start, end)?;
        tracing::info!(%ticker, rows = observations.len(), path = %path.display(), "imported CSV prices");
        Ok(FetchResult {
            ticker: ticker.clone(),
            observations,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
