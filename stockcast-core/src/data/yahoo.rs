//! Yahoo Finance price provider.
//!
//! Fetches daily OHLCV rows from Yahoo's v8 chart API with bounded retries,
//! exponential backoff, and the shared circuit breaker.
//!
//! Yahoo has no official API and changes its response format without notice;
//! the CSV import provider is the offline fallback.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{PriceObservation, Ticker};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const CHART_ENDPOINT: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance chart API client.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Chart API URL for an inclusive date range.
    fn chart_url(ticker: &Ticker, start: NaiveDate, end: NaiveDate) -> String {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_400;
        format!(
            "{CHART_ENDPOINT}/{ticker}?period1={period1}&period2={period2}&interval=1d&events=history"
        )
    }

    /// Parse a chart API response into observations, ascending by date.
    fn parse_response(
        ticker: &Ticker,
        resp: ChartResponse,
    ) -> Result<Vec<PriceObservation>, DataError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound {
                    symbol: ticker.to_string(),
                })
            }
            (None, Some(err)) => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(DataError::ResponseFormatChanged(
                    "empty result with no error".into(),
                ))
            }
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // No timestamps means no trading days in range.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

        let mut observations = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let pick = |v: &[Option<f64>]| v.get(i).copied().flatten().unwrap_or(f64::NAN);
            let obs = PriceObservation {
                date,
                open: pick(quote.open.as_slice()),
                high: pick(quote.high.as_slice()),
                low: pick(quote.low.as_slice()),
                close: pick(quote.close.as_slice()),
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            };

            // Holidays come back as all-null rows
            if obs.is_void() && obs.volume == 0 {
                continue;
            }
            observations.push(obs);
        }

        observations.sort_by_key(|o| o.date);
        observations.dedup_by_key(|o| o.date);
        Ok(observations)
    }

    fn fetch_with_retry(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceObservation>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(ticker, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(%ticker, attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                // Unknown symbols answer 404 with a JSON error body
                return match resp.json::<ChartResponse>() {
                    Ok(chart) => Self::parse_response(ticker, chart),
                    Err(_) => Err(DataError::SymbolNotFound {
                        symbol: ticker.to_string(),
                    }),
                };
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {ticker}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
            })?;
            let observations = Self::parse_response(ticker, chart)?;
            self.circuit_breaker.record_success();
            return Ok(observations);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        tracing::info!(%ticker, %start, %end, "fetching prices from Yahoo Finance");
        let observations = self.fetch_with_retry(ticker, start, end)?;
        tracing::info!(%ticker, rows = observations.len(), "Yahoo fetch complete");
        Ok(FetchResult {
            ticker: ticker.clone(),
            observations,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    fn parse(json: &str) -> Result<Vec<PriceObservation>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response(&ticker(), resp)
    }

    #[test]
    fn url_covers_inclusive_range() {
        let url = YahooProvider::chart_url(
            &ticker(),
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2015, 1, 2).unwrap(),
        );
        assert!(url.contains("/AAPL?"));
        assert!(url.contains("period1=1420070400"));
        assert!(url.contains("period2=1420243200"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn parses_rows_with_gmt_offset_and_nulls() {
        let json = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":-18000},
            "timestamp":[1704205800,1704292200,1704378600],
            "indicators":{"quote":[{
                "open":[187.15,184.22,null],
                "high":[188.44,185.88,null],
                "low":[183.89,183.43,null],
                "close":[185.64,null,null],
                "volume":[82488700,58414500,null]
            }]}
        }],"error":null}}"#;

        let rows = parse(json).unwrap();
        // Third row is an all-null holiday
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rows[0].close, 185.64);
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert!(rows[1].close.is_nan());
        assert_eq!(rows[1].volume, 58_414_500);
    }

    #[test]
    fn missing_timestamps_means_empty_range() {
        let json = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":-18000},
            "indicators":{"quote":[{}]}
        }],"error":null}}"#;
        assert!(parse(json).unwrap().is_empty());
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn other_errors_are_format_changes() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }
}
