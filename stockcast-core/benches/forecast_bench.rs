//! Criterion benchmarks for Stockcast hot paths.
//!
//! Benchmarks:
//! 1. Cleaner over a multi-year price frame
//! 2. Model fit (normal equations + Cholesky)
//! 3. Full forecast with uncertainty sampling

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stockcast_core::data::{clean_training_frame, frame_from_observations};
use stockcast_core::domain::{PriceObservation, TrainingRow};
use stockcast_core::forecast::{AdditiveForecaster, Forecaster, ModelConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_observations(n: usize) -> Vec<PriceObservation> {
    let base = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.02;
            PriceObservation {
                date: base + Days::new(i as u64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close: if i % 50 == 0 { f64::NAN } else { close },
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect()
}

fn make_rows(n: usize) -> Vec<TrainingRow> {
    make_observations(n)
        .into_iter()
        .filter(|o| o.close.is_finite())
        .map(|o| TrainingRow::new(o.date, o.close))
        .collect()
}

// ── 1. Cleaner ───────────────────────────────────────────────────────

fn bench_cleaner(c: &mut Criterion) {
    let df = frame_from_observations(&make_observations(3000)).unwrap();
    c.bench_function("clean_training_frame/3000", |b| {
        b.iter(|| clean_training_frame(black_box(&df)).unwrap())
    });
}

// ── 2. Fit ───────────────────────────────────────────────────────────

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    let forecaster = AdditiveForecaster::default();
    for n in [500usize, 1500, 3000] {
        let rows = make_rows(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &rows, |b, rows| {
            b.iter(|| forecaster.fit(black_box(rows)).unwrap())
        });
    }
    group.finish();
}

// ── 3. Forecast with sampling ────────────────────────────────────────

fn bench_forecast(c: &mut Criterion) {
    let mut group = c.benchmark_group("forecast");
    group.sample_size(10);
    let rows = make_rows(2500);
    for samples in [0usize, 250, 1000] {
        let forecaster = AdditiveForecaster::new(ModelConfig {
            uncertainty_samples: samples,
            ..Default::default()
        })
        .unwrap();
        group.bench_with_input(BenchmarkId::new("samples", samples), &rows, |b, rows| {
            b.iter(|| forecaster.forecast(black_box(rows), 365).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cleaner, bench_fit, bench_forecast);
criterion_main!(benches);
