//! Stockcast CLI: download, forecast, and cache management commands.
//!
//! Commands:
//! - `download`: fetch daily prices and cache them as Parquet
//! - `forecast`: run the pipeline for one ticker and horizon
//! - `cache status`: report cached tickers, date ranges and sizes
//! - `cache remove`: drop cached tickers
//! - `tickers`: list the selectable tickers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stockcast_core::data::{
    download_tickers, CircuitBreaker, CsvProvider, DataProvider, ParquetCache, StdoutProgress,
    YahooProvider,
};
use stockcast_core::domain::{Horizon, Ticker};
use stockcast_runner::{
    forecast_tail_table, raw_tail_table, save_forecast, AppConfig, Pipeline, PipelineRequest,
    TAIL_ROWS,
};

#[derive(Parser)]
#[command(name = "stockcast", about = "Stockcast CLI: daily stock price forecasting")]
struct Cli {
    /// Path to a TOML config file. Defaults to ./stockcast.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily prices and cache them as Parquet.
    Download {
        /// Tickers to download (e.g., AAPL MSFT).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to the configured start.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Fit the model to a ticker's closing prices and forecast ahead.
    Forecast {
        /// Ticker from the configured set.
        #[arg(long)]
        ticker: String,

        /// Years of prediction.
        #[arg(long, default_value_t = 1)]
        years: u32,

        /// Write the forecast to a .csv or .json file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Override the number of uncertainty samples.
        #[arg(long)]
        samples: Option<usize>,

        /// Override the sampling seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Offline mode: serve from cache only.
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// List the selectable tickers.
    Tickers,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached tickers, date ranges and sizes.
    Status,
    /// Remove cached prices for the given tickers.
    Remove {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Download {
            tickers,
            start,
            end,
            force,
        } => run_download(&config, &tickers, start, end, force),
        Commands::Forecast {
            ticker,
            years,
            export,
            samples,
            seed,
            offline,
        } => {
            if let Some(n) = samples {
                config.model.uncertainty_samples = n;
            }
            if let Some(s) = seed {
                config.model.seed = s;
            }
            config.data.offline |= offline;
            run_forecast(&config, &ticker, years, export.as_deref())
        }
        Commands::Cache { action } => match action {
            CacheAction::Status => run_cache_status(&config.data.cache_dir),
            CacheAction::Remove { tickers } => run_cache_remove(&config.data.cache_dir, &tickers),
        },
        Commands::Tickers => run_tickers(&config),
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
    })
    .transpose()
}

fn run_download(
    config: &AppConfig,
    raw_tickers: &[String],
    start: Option<String>,
    end: Option<String>,
    force: bool,
) -> Result<()> {
    if config.data.offline {
        bail!("download is unavailable in offline mode");
    }
    let today = Local::now().date_naive();
    let start = parse_date(start.as_deref())?.unwrap_or(config.data.start);
    let end = parse_date(end.as_deref())?.unwrap_or_else(|| config.end_date(today));
    if start > end {
        bail!("start {start} is after end {end}");
    }

    let tickers = raw_tickers
        .iter()
        .map(|s| Ticker::parse(s))
        .collect::<Result<Vec<_>, _>>()?;

    let provider: Box<dyn DataProvider> = match &config.data.csv_dir {
        Some(dir) => Box::new(CsvProvider::new(dir.clone())),
        None => Box::new(YahooProvider::new(Arc::new(
            CircuitBreaker::default_provider(),
        ))?),
    };
    let cache = ParquetCache::new(&config.data.cache_dir);
    tracing::info!(
        tickers = tickers.len(),
        provider = provider.name(),
        %start,
        %end,
        force,
        "downloading"
    );

    let summary = download_tickers(
        provider.as_ref(),
        &cache,
        &tickers,
        start,
        end,
        force,
        &StdoutProgress,
    );

    if !summary.all_succeeded() {
        for (ticker, err) in &summary.errors {
            tracing::warn!(%ticker, error = %err, "download failed");
            eprintln!("Error for {ticker}: {err}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run_forecast(
    config: &AppConfig,
    raw_ticker: &str,
    years: u32,
    export: Option<&Path>,
) -> Result<()> {
    let tickers = config.ticker_set()?;
    let ticker = tickers.resolve(raw_ticker)?;
    let horizon = Horizon::new(years, config.horizon_bounds()?)?;
    let today = Local::now().date_naive();

    let pipeline = Pipeline::from_config(config)?;
    let request = PipelineRequest {
        ticker,
        horizon,
        start: config.data.start,
        end: config.end_date(today),
    };

    tracing::info!(ticker = %request.ticker, horizon = %request.horizon, "running forecast");
    println!("Loading data...");
    let output = pipeline.run(&request)?;
    println!("Loading data... Done!");
    println!();

    println!(
        "=== Raw data: {} ({}) ===",
        output.ticker,
        output.source().label()
    );
    print!("{}", raw_tail_table(output.observations(), TAIL_ROWS));
    println!();
    println!("=== Forecast data: {} ===", output.horizon);
    print!("{}", forecast_tail_table(&output.forecast, TAIL_ROWS));
    println!();
    println!("Training rows:  {}", output.rows.len());
    println!("Forecast rows:  {}", output.forecast.rows.len());
    println!("Model:          {}", pipeline.forecaster_name());

    if let Some(path) = export {
        let format = save_forecast(&output, path)?;
        tracing::info!(path = %path.display(), ?format, "forecast exported");
        println!("Forecast saved ({format:?}) to: {}", path.display());
    }
    Ok(())
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ParquetCache::new(cache_dir);
    let tickers = cache.cached_tickers();
    if tickers.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let statuses = cache.status(&tickers);
    let sizes: Vec<u64> = tickers
        .iter()
        .map(|t| dir_size(&cache_dir.join(format!("ticker={t}"))))
        .collect();
    let total_size: u64 = sizes.iter().sum();

    println!("Cache: {}", cache_dir.display());
    println!("Tickers: {}", tickers.len());
    println!("Total size: {}", format_size(total_size));
    println!();
    println!(
        "{:<8} {:<25} {:<10} {:<17} {:>10}",
        "Ticker", "Date Range", "Rows", "Cached At", "Size"
    );
    println!("{}", "-".repeat(74));
    for (status, size) in statuses.iter().zip(sizes) {
        let range = match (status.first_date, status.last_date) {
            (Some(a), Some(b)) => format!("{a} to {b}"),
            _ => "(no meta)".into(),
        };
        let rows = status.row_count.map(|n| n.to_string()).unwrap_or_default();
        let cached_at = status
            .cached_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<8} {:<25} {:<10} {:<17} {:>10}",
            status.ticker,
            range,
            rows,
            cached_at,
            format_size(size)
        );
    }
    Ok(())
}

fn run_cache_remove(cache_dir: &Path, raw_tickers: &[String]) -> Result<()> {
    let cache = ParquetCache::new(cache_dir);
    for raw in raw_tickers {
        let ticker = Ticker::parse(raw)?;
        if cache.get_meta(&ticker).is_none() {
            println!("Not cached: {ticker}");
            continue;
        }
        cache.remove(&ticker)?;
        tracing::debug!(%ticker, "cache entry removed");
        println!("Removed: {ticker}");
    }
    Ok(())
}

fn run_tickers(config: &AppConfig) -> Result<()> {
    let tickers = config.ticker_set()?;
    let bounds = config.horizon_bounds()?;
    for ticker in tickers.tickers() {
        println!("{ticker}");
    }
    println!();
    println!(
        "Years of prediction: {} to {}",
        bounds.min_years, bounds.max_years
    );
    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    let mut size = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                size += meta.len();
            }
        }
    }
    size
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
