//! Data cleaner: price frame → `(timestamp, value)` training frame.
//!
//! Selects the date and close columns, renames them, coerces the close to
//! Float64 and drops every row where either is missing. Text that does not
//! parse as a number becomes null and is dropped; NaN and infinities count
//! as missing. Row order is preserved and nothing else is touched: no
//! outlier removal, no resampling, no timezone handling.
//!
//! An empty result is returned as an empty frame. Deciding that "nothing
//! usable" is fatal belongs to the caller.

use super::frame::{self, CLOSE, DATE, TIMESTAMP, VALUE};
use crate::domain::{PriceObservation, TrainingRow};
use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("column '{column}' has type {dtype}; expected a date or datetime")]
    UnsupportedDateType { column: String, dtype: String },

    #[error("cleaning failed: {0}")]
    Polars(#[from] PolarsError),
}

/// Names of the input columns the cleaner reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanerColumns {
    pub date: String,
    pub close: String,
}

impl Default for CleanerColumns {
    fn default() -> Self {
        Self {
            date: DATE.to_string(),
            close: CLOSE.to_string(),
        }
    }
}

fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, CleanError> {
    df.column(name).map_err(|_| CleanError::MissingColumn {
        column: name.to_string(),
        available: df
            .get_column_names()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Clean a price frame using the default `date` / `close` column names.
pub fn clean_training_frame(df: &DataFrame) -> Result<DataFrame, CleanError> {
    clean_training_frame_with(df, &CleanerColumns::default())
}

/// Clean a price frame with explicit column names.
pub fn clean_training_frame_with(
    df: &DataFrame,
    columns: &CleanerColumns,
) -> Result<DataFrame, CleanError> {
    let date_dtype = require_column(df, &columns.date)?.dtype().clone();
    require_column(df, &columns.close)?;

    let date_expr = match date_dtype {
        DataType::Date => col(columns.date.as_str()),
        DataType::Datetime(_, _) => col(columns.date.as_str()).cast(DataType::Date),
        other => {
            return Err(CleanError::UnsupportedDateType {
                column: columns.date.clone(),
                dtype: other.to_string(),
            })
        }
    };

    let cleaned = df
        .clone()
        .lazy()
        .select([
            date_expr.alias(TIMESTAMP),
            // Non-strict cast: unparseable text becomes null
            col(columns.close.as_str())
                .cast(DataType::Float64)
                .alias(VALUE),
        ])
        .filter(
            col(TIMESTAMP)
                .is_not_null()
                .and(col(VALUE).is_not_null())
                .and(col(VALUE).is_finite()),
        )
        .collect()?;

    tracing::debug!(
        input_rows = df.height(),
        kept_rows = cleaned.height(),
        "cleaned training frame"
    );
    Ok(cleaned)
}

/// Clean a price frame and return typed rows.
pub fn training_rows(df: &DataFrame) -> Result<Vec<TrainingRow>, CleanError> {
    training_rows_with(df, &CleanerColumns::default())
}

pub fn training_rows_with(
    df: &DataFrame,
    columns: &CleanerColumns,
) -> Result<Vec<TrainingRow>, CleanError> {
    let cleaned = clean_training_frame_with(df, columns)?;
    Ok(frame::rows_from_clean_frame(&cleaned)?)
}

/// Clean provider observations directly.
pub fn clean_observations(
    observations: &[PriceObservation],
) -> Result<Vec<TrainingRow>, CleanError> {
    let df = frame::frame_from_observations(observations)?;
    training_rows(&df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn date_column(name: &str, dates: &[NaiveDate]) -> Column {
        let days: Vec<i32> = dates
            .iter()
            .map(|d| (*d - NaiveDate::default()).num_days() as i32)
            .collect();
        Column::new(name.into(), days).cast(&DataType::Date).unwrap()
    }

    #[test]
    fn drops_non_numeric_close() {
        let df = DataFrame::new(vec![
            date_column("date", &[d(2021, 1, 1), d(2021, 1, 2), d(2021, 1, 3)]),
            Column::new("close".into(), ["100", "bad", "102"]),
        ])
        .unwrap();

        let rows = training_rows(&df).unwrap();
        assert_eq!(
            rows,
            vec![
                TrainingRow::new(d(2021, 1, 1), 100.0),
                TrainingRow::new(d(2021, 1, 3), 102.0),
            ]
        );
    }

    #[test]
    fn output_has_exactly_two_renamed_columns() {
        let df = DataFrame::new(vec![
            date_column("date", &[d(2021, 1, 1)]),
            Column::new("open".into(), [1.0]),
            Column::new("close".into(), [2.0]),
        ])
        .unwrap();
        let cleaned = clean_training_frame(&df).unwrap();
        let names: Vec<&str> = cleaned
            .get_column_names()
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(names, vec![TIMESTAMP, VALUE]);
        assert_eq!(cleaned.column(TIMESTAMP).unwrap().dtype(), &DataType::Date);
        assert_eq!(cleaned.column(VALUE).unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn null_and_nan_closes_are_missing() {
        let df = DataFrame::new(vec![
            date_column("date", &[d(2021, 1, 4), d(2021, 1, 5), d(2021, 1, 6), d(2021, 1, 7)]),
            Column::new(
                "close".into(),
                [Some(1.5), None, Some(f64::NAN), Some(f64::INFINITY)],
            ),
        ])
        .unwrap();
        let rows = training_rows(&df).unwrap();
        assert_eq!(rows, vec![TrainingRow::new(d(2021, 1, 4), 1.5)]);
    }

    #[test]
    fn null_dates_are_dropped() {
        let dates = Column::new("date".into(), [Some(18_628i32), None])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![dates, Column::new("close".into(), [1.0, 2.0])]).unwrap();
        let rows = training_rows(&df).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 1.0);
    }

    #[test]
    fn all_bad_closes_yield_empty_frame() {
        let df = DataFrame::new(vec![
            date_column("date", &[d(2021, 1, 1), d(2021, 1, 2)]),
            Column::new("close".into(), ["n/a", ""]),
        ])
        .unwrap();
        assert_eq!(clean_training_frame(&df).unwrap().height(), 0);
    }

    #[test]
    fn datetime_is_truncated_to_date() {
        // 2021-01-01T15:30Z and 2021-01-02T00:00Z
        let ms = vec![1_609_515_000_000i64, 1_609_545_600_000];
        let dates = Column::new("date".into(), ms)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let df = DataFrame::new(vec![dates, Column::new("close".into(), [10.0, 11.0])]).unwrap();
        let rows = training_rows(&df).unwrap();
        assert_eq!(rows[0].timestamp, d(2021, 1, 1));
        assert_eq!(rows[1].timestamp, d(2021, 1, 2));
    }

    #[test]
    fn custom_column_names() {
        let df = DataFrame::new(vec![
            date_column("Date", &[d(2021, 1, 1)]),
            Column::new("Close".into(), [3.0]),
        ])
        .unwrap();
        let columns = CleanerColumns {
            date: "Date".into(),
            close: "Close".into(),
        };
        assert_eq!(clean_training_frame_with(&df, &columns).unwrap().height(), 1);
        assert!(matches!(
            clean_training_frame(&df),
            Err(CleanError::MissingColumn { .. })
        ));
    }

    #[test]
    fn string_dates_are_rejected() {
        let df = DataFrame::new(vec![
            Column::new("date".into(), ["2021-01-01"]),
            Column::new("close".into(), [1.0]),
        ])
        .unwrap();
        assert!(matches!(
            clean_training_frame(&df),
            Err(CleanError::UnsupportedDateType { .. })
        ));
    }

    #[test]
    fn observations_keep_order() {
        let obs: Vec<PriceObservation> = (0..4)
            .map(|i| PriceObservation {
                date: d(2021, 3, 1 + i),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: if i == 2 { f64::NAN } else { 10.0 + i as f64 },
                volume: 0,
            })
            .collect();
        let rows = clean_observations(&obs).unwrap();
        let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![10.0, 11.0, 13.0]);
    }
}
