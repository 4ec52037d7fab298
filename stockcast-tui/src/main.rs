//! Stockcast TUI: ticker selector, horizon slider and four panels.
//!
//! Panels:
//! 1. Raw data: last rows of prices, Open/Close chart with zoom and pan
//! 2. Forecast: forecast tail and forecast chart with uncertainty band
//! 3. Components: trend, weekly and yearly seasonality
//! 4. Help: keyboard shortcuts

mod app;
mod input;
mod persistence;
mod theme;
mod ui;

#[cfg(test)]
mod test_helpers;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use stockcast_runner::{AppConfig, Pipeline};

use crate::app::{AppState, RunKind};

fn main() -> Result<()> {
    // Restore the terminal before printing a panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let app_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockcast");
    init_logging(&app_dir)?;

    let config = AppConfig::load(None)?;
    let pipeline = Pipeline::from_config(&config)?;
    let today = Local::now().date_naive();
    let state_path = app_dir.join("state.json");

    let persisted = persistence::load(&state_path);
    let mut app = AppState::new(
        pipeline,
        config.ticker_set()?,
        config.horizon_bounds()?,
        (config.data.start, config.end_date(today)),
        state_path,
    );
    persistence::apply(&mut app, persisted);
    app.request_run(RunKind::Run);

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    let persisted = persistence::extract(&app);
    if let Err(e) = persistence::save(&app.state_path, &persisted) {
        tracing::warn!(error = %e, "failed to save UI state");
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Log to `<config dir>/stockcast/stockcast.log`; the terminal belongs to the UI.
fn init_logging(app_dir: &std::path::Path) -> Result<()> {
    fs::create_dir_all(app_dir)
        .with_context(|| format!("creating {}", app_dir.display()))?;
    let log_path = app_dir.join("stockcast.log");
    let file = File::create(&log_path)
        .with_context(|| format!("creating {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // A pending run blocks the loop; the frame above already shows "Loading data...".
        if app.pending.is_some() {
            app.execute_pending();
            continue;
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        if !app.running {
            break;
        }
    }
    Ok(())
}
