//! Property tests for the training-data cleaner.
//!
//! Uses proptest to verify:
//! 1. Exactly the rows with a date and a numeric close survive, unchanged
//! 2. Text closes that do not parse are dropped, parseable ones kept
//! 3. A frame with no usable close yields an empty result

use chrono::NaiveDate;
use polars::prelude::*;
use proptest::prelude::*;
use stockcast_core::data::{clean_training_frame, training_rows};
use stockcast_core::domain::TrainingRow;

// ── Helpers ──────────────────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

fn date_column(offsets: &[Option<i32>]) -> Column {
    let base = (base_date() - NaiveDate::default()).num_days() as i32;
    let days: Vec<Option<i32>> = offsets.iter().map(|o| o.map(|d| base + d)).collect();
    Column::new("date".into(), days)
        .cast(&DataType::Date)
        .unwrap()
}

fn sequential(n: usize) -> Vec<Option<i32>> {
    (0..n as i32).map(Some).collect()
}

// ── Strategies ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Close {
    Price(f64),
    Missing,
    NotANumber,
}

fn arb_close() -> impl Strategy<Value = Close> {
    prop_oneof![
        6 => (0.01..5000.0_f64).prop_map(Close::Price),
        1 => Just(Close::Missing),
        1 => Just(Close::NotANumber),
    ]
}

fn arb_text_close() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        4 => (1u32..100_000).prop_map(|cents| Some(format!("{}.{:02}", cents / 100, cents % 100))),
        1 => Just(Some("bad".to_string())),
        1 => Just(Some(String::new())),
        1 => Just(None),
    ]
}

// ── 1. Survivors are exactly the usable rows ─────────────────────────

proptest! {
    #[test]
    fn keeps_exactly_usable_rows(
        closes in prop::collection::vec(arb_close(), 0..60),
        null_dates in prop::collection::vec(any::<bool>(), 60),
    ) {
        let offsets: Vec<Option<i32>> = (0..closes.len())
            .map(|i| if null_dates[i] && i % 7 == 0 { None } else { Some(i as i32) })
            .collect();
        let values: Vec<Option<f64>> = closes
            .iter()
            .map(|c| match c {
                Close::Price(p) => Some(*p),
                Close::Missing => None,
                Close::NotANumber => Some(f64::NAN),
            })
            .collect();

        let df = DataFrame::new(vec![
            date_column(&offsets),
            Column::new("close".into(), values.clone()),
        ])
        .unwrap();

        let expected: Vec<TrainingRow> = offsets
            .iter()
            .zip(&values)
            .filter_map(|(o, v)| match (o, v) {
                (Some(d), Some(v)) if v.is_finite() => Some(TrainingRow::new(
                    base_date() + chrono::Days::new(*d as u64),
                    *v,
                )),
                _ => None,
            })
            .collect();

        let rows = training_rows(&df).unwrap();
        prop_assert_eq!(rows, expected);
    }
}

// ── 2. Text closes ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn parses_numeric_text_and_drops_the_rest(
        closes in prop::collection::vec(arb_text_close(), 1..40),
    ) {
        let df = DataFrame::new(vec![
            date_column(&sequential(closes.len())),
            Column::new("close".into(), closes.clone()),
        ])
        .unwrap();

        let expected: Vec<(i64, f64)> = closes
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                c.as_deref()
                    .and_then(|s| s.parse::<f64>().ok())
                    .map(|v| (i as i64, v))
            })
            .collect();

        let rows = training_rows(&df).unwrap();
        prop_assert_eq!(rows.len(), expected.len());
        for (row, (offset, value)) in rows.iter().zip(&expected) {
            prop_assert_eq!((row.timestamp - base_date()).num_days(), *offset);
            prop_assert!((row.value - value).abs() < 1e-9);
        }
    }
}

// ── 3. Nothing usable ────────────────────────────────────────────────

proptest! {
    #[test]
    fn no_numeric_close_means_empty(n in 0usize..30, use_text in any::<bool>()) {
        let close = if use_text {
            Column::new("close".into(), vec!["n/a"; n])
        } else {
            Column::new("close".into(), vec![None::<f64>; n])
        };
        let df = DataFrame::new(vec![date_column(&sequential(n)), close]).unwrap();

        let cleaned = clean_training_frame(&df).unwrap();
        prop_assert_eq!(cleaned.height(), 0);
        prop_assert_eq!(cleaned.width(), 2);
    }
}
