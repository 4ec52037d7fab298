//! Reporting and export: tail tables for the terminal, CSV and JSON files.
//!
//! - **Tables**: the last rows of the raw observations and of the forecast
//! - **CSV**: `ds,yhat,yhat_lower,yhat_upper` plus trend and seasonal columns
//! - **JSON**: the full forecast with provenance, versioned

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use stockcast_core::data::DataSource;
use stockcast_core::domain::{Forecast, PriceObservation};

use crate::pipeline::PipelineOutput;

/// Rows shown by the tail tables.
pub const TAIL_ROWS: usize = 5;

/// Current schema version for exported JSON.
pub const SCHEMA_VERSION: u32 = 1;

// ─── Tables ─────────────────────────────────────────────────────────

/// Fixed-width table of the last `n` observations.
pub fn raw_tail_table(observations: &[PriceObservation], n: usize) -> String {
    let tail = &observations[observations.len().saturating_sub(n)..];
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>12}",
        "Date", "Open", "High", "Low", "Close", "Volume"
    );
    for o in tail {
        let _ = writeln!(
            out,
            "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12}",
            o.date.to_string(),
            o.open,
            o.high,
            o.low,
            o.close,
            o.volume
        );
    }
    out
}

/// Fixed-width table of the last `n` forecast rows.
pub fn forecast_tail_table(forecast: &Forecast, n: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>12} {:>12} {:>12}",
        "ds", "yhat", "yhat_lower", "yhat_upper"
    );
    for r in forecast.tail(n) {
        let _ = writeln!(
            out,
            "{:<12} {:>12.4} {:>12.4} {:>12.4}",
            r.timestamp.to_string(),
            r.point_estimate,
            r.lower_bound,
            r.upper_bound
        );
    }
    out
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Forecast rows as CSV.
///
/// Columns: ds, yhat, yhat_lower, yhat_upper, trend, trend_lower,
/// trend_upper, weekly, yearly. Seasonal columns are empty when that
/// seasonality was not fitted.
pub fn export_forecast_csv(forecast: &Forecast) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ds",
        "yhat",
        "yhat_lower",
        "yhat_upper",
        "trend",
        "trend_lower",
        "trend_upper",
        "weekly",
        "yearly",
    ])?;

    let c = &forecast.components;
    let opt = |v: &Option<Vec<f64>>, i: usize| {
        v.as_ref()
            .and_then(|v| v.get(i))
            .map(|x| format!("{x:.6}"))
            .unwrap_or_default()
    };
    let at = |v: &[f64], i: usize| v.get(i).map(|x| format!("{x:.6}")).unwrap_or_default();

    for (i, r) in forecast.rows.iter().enumerate() {
        wtr.write_record([
            r.timestamp.to_string(),
            format!("{:.6}", r.point_estimate),
            format!("{:.6}", r.lower_bound),
            format!("{:.6}", r.upper_bound),
            at(&c.trend, i),
            at(&c.trend_lower, i),
            at(&c.trend_upper, i),
            opt(&c.weekly, i),
            opt(&c.yearly, i),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

/// Exported forecast with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub ticker: String,
    pub horizon_years: u32,
    pub horizon_days: u32,
    pub source: DataSource,
    pub dataset_hash: String,
    /// BLAKE3 over dataset hash, ticker and horizon.
    pub run_id: String,
    pub observations: usize,
    pub training_rows: usize,
    pub forecast: Forecast,
}

fn default_schema_version() -> u32 {
    1
}

/// Stable identifier for one (data, ticker, horizon) combination.
pub fn run_id(dataset_hash: &str, ticker: &str, horizon_days: u32) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(dataset_hash.as_bytes());
    hasher.update(ticker.as_bytes());
    hasher.update(&horizon_days.to_le_bytes());
    hasher.finalize().to_hex().as_str()[..16].to_string()
}

impl ForecastReport {
    pub fn from_output(output: &PipelineOutput) -> Self {
        let ticker = output.ticker.to_string();
        let horizon_days = output.horizon.days();
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: run_id(output.dataset_hash(), &ticker, horizon_days),
            ticker,
            horizon_years: output.horizon.years(),
            horizon_days,
            source: output.source(),
            dataset_hash: output.dataset_hash().to_string(),
            observations: output.observations().len(),
            training_rows: output.rows.len(),
            forecast: (*output.forecast).clone(),
        }
    }
}

pub fn export_json(report: &ForecastReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize forecast report to JSON")
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ForecastReport> {
    let report: ForecastReport =
        serde_json::from_str(json).context("failed to deserialize forecast report")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

/// Export format chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Write the forecast of `output` to `path` (`.csv` or `.json`).
pub fn save_forecast(output: &PipelineOutput, path: &Path) -> Result<ExportFormat> {
    let Some(format) = ExportFormat::from_path(path) else {
        bail!(
            "unsupported export extension for {} (use .csv or .json)",
            path.display()
        );
    };
    let content = match format {
        ExportFormat::Csv => export_forecast_csv(&output.forecast)?,
        ExportFormat::Json => export_json(&ForecastReport::from_output(output))?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), ?format, "exported forecast");
    Ok(format)
}
