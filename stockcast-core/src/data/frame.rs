//! Conversions between observations and polars DataFrames.
//!
//! The frame layout is the one the cache writes and the cleaner reads:
//! `date` (Date), `open`/`high`/`low`/`close` (Float64), `volume` (UInt64).

use crate::domain::{PriceObservation, TrainingRow};
use chrono::NaiveDate;
use polars::prelude::*;

pub const DATE: &str = "date";
pub const OPEN: &str = "open";
pub const HIGH: &str = "high";
pub const LOW: &str = "low";
pub const CLOSE: &str = "close";
pub const VOLUME: &str = "volume";

pub const PRICE_COLUMNS: [&str; 6] = [DATE, OPEN, HIGH, LOW, CLOSE, VOLUME];

/// Cleaned frame column names.
pub const TIMESTAMP: &str = "timestamp";
pub const VALUE: &str = "value";

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

fn date_from_days(days: i32) -> NaiveDate {
    epoch() + chrono::Duration::days(days as i64)
}

/// Build a price frame. NaN prices stay NaN; the cleaner treats them as missing.
pub fn frame_from_observations(observations: &[PriceObservation]) -> PolarsResult<DataFrame> {
    let dates: Vec<i32> = observations.iter().map(|o| days_since_epoch(o.date)).collect();
    let opens: Vec<f64> = observations.iter().map(|o| o.open).collect();
    let highs: Vec<f64> = observations.iter().map(|o| o.high).collect();
    let lows: Vec<f64> = observations.iter().map(|o| o.low).collect();
    let closes: Vec<f64> = observations.iter().map(|o| o.close).collect();
    let volumes: Vec<u64> = observations.iter().map(|o| o.volume).collect();

    DataFrame::new(vec![
        Column::new(DATE.into(), dates).cast(&DataType::Date)?,
        Column::new(OPEN.into(), opens),
        Column::new(HIGH.into(), highs),
        Column::new(LOW.into(), lows),
        Column::new(CLOSE.into(), closes),
        Column::new(VOLUME.into(), volumes),
    ])
}

/// Read a price frame back. Null prices become NaN, a null volume 0.
pub fn observations_from_frame(df: &DataFrame) -> PolarsResult<Vec<PriceObservation>> {
    let dates = df.column(DATE)?.date()?;
    let opens = df.column(OPEN)?.f64()?;
    let highs = df.column(HIGH)?.f64()?;
    let lows = df.column(LOW)?.f64()?;
    let closes = df.column(CLOSE)?.f64()?;
    let volumes = df.column(VOLUME)?.u64()?;

    let mut out = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = dates
            .get(i)
            .ok_or_else(|| PolarsError::ComputeError(format!("null date at row {i}").into()))?;
        out.push(PriceObservation {
            date: date_from_days(days),
            open: opens.get(i).unwrap_or(f64::NAN),
            high: highs.get(i).unwrap_or(f64::NAN),
            low: lows.get(i).unwrap_or(f64::NAN),
            close: closes.get(i).unwrap_or(f64::NAN),
            volume: volumes.get(i).unwrap_or(0),
        });
    }
    Ok(out)
}

/// Read a cleaned `(timestamp, value)` frame into typed rows.
pub fn rows_from_clean_frame(df: &DataFrame) -> PolarsResult<Vec<TrainingRow>> {
    let timestamps = df.column(TIMESTAMP)?.date()?;
    let values = df.column(VALUE)?.f64()?;

    let mut out = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        match (timestamps.get(i), values.get(i)) {
            (Some(days), Some(value)) => out.push(TrainingRow::new(date_from_days(days), value)),
            _ => {
                return Err(PolarsError::ComputeError(
                    format!("null in cleaned frame at row {i}").into(),
                ))
            }
        }
    }
    Ok(out)
}
