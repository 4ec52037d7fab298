//! Application state: single-owner, main-thread only.
//!
//! Every interaction that changes the ticker or horizon queues a pipeline
//! run. The event loop draws one "Loading data..." frame, then executes the
//! run synchronously; the pipeline memo makes repeated inputs instant.

use std::collections::VecDeque;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use stockcast_core::domain::{Horizon, HorizonBounds, Ticker, TickerSet};
use stockcast_runner::{Pipeline, PipelineError, PipelineOutput, PipelineRequest};

/// Maximum entries kept in the error history overlay.
pub const ERROR_HISTORY_CAP: usize = 50;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    Raw,
    Forecast,
    Components,
    Help,
}

impl Panel {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            Panel::Raw => 0,
            Panel::Forecast => 1,
            Panel::Components => 2,
            Panel::Help => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Raw),
            1 => Some(Panel::Forecast),
            2 => Some(Panel::Components),
            3 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Raw => "Raw data",
            Panel::Forecast => "Forecast",
            Panel::Components => "Components",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % Self::COUNT).unwrap_or(Panel::Raw)
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + Self::COUNT - 1) % Self::COUNT).unwrap_or(Panel::Raw)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Model,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Model => "MODEL",
            ErrorCategory::Other => "ERR",
        }
    }

    pub fn of(err: &PipelineError) -> Self {
        match err {
            PipelineError::FetchFailed(_) => ErrorCategory::Network,
            PipelineError::NoDataFound { .. }
            | PipelineError::EmptyAfterCleaning { .. }
            | PipelineError::DataPreparationFailure { .. } => ErrorCategory::Data,
            PipelineError::ForecastFailed { .. } => ErrorCategory::Model,
        }
    }
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Load state line under the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Done,
    Failed,
}

impl LoadState {
    pub fn text(self) -> &'static str {
        match self {
            LoadState::Idle => "",
            LoadState::Loading => "Loading data...",
            LoadState::Done => "Loading data... Done!",
            LoadState::Failed => "Loading data... Failed",
        }
    }
}

/// Queued pipeline work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Run,
    /// Drop memoized results and re-fetch.
    Refresh,
}

/// Visible range of the raw price chart, counted from the end of the series.
///
/// `visible == None` shows everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChartWindow {
    pub visible: Option<usize>,
    pub offset_from_end: usize,
}

impl ChartWindow {
    pub const MIN_VISIBLE: usize = 20;

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Index range into a series of `len` points.
    pub fn range(&self, len: usize) -> Range<usize> {
        let visible = self.visible.unwrap_or(len).min(len);
        let max_offset = len - visible;
        let offset = self.offset_from_end.min(max_offset);
        let end = len - offset;
        (end - visible)..end
    }

    pub fn zoom_in(&mut self, len: usize) {
        let current = self.visible.unwrap_or(len).min(len);
        let next = (current / 2).max(Self::MIN_VISIBLE);
        if next < len {
            self.visible = Some(next);
        }
    }

    pub fn zoom_out(&mut self, len: usize) {
        let Some(current) = self.visible else {
            return;
        };
        let next = current.saturating_mul(2);
        if next >= len {
            self.reset();
        } else {
            self.visible = Some(next);
            self.offset_from_end = self.offset_from_end.min(len - next);
        }
    }

    /// Move toward older data by a quarter window.
    pub fn pan_back(&mut self, len: usize) {
        let Some(visible) = self.visible else {
            return;
        };
        let step = (visible / 4).max(1);
        self.offset_from_end = (self.offset_from_end + step).min(len.saturating_sub(visible));
    }

    /// Move toward newer data by a quarter window.
    pub fn pan_forward(&mut self) {
        let step = (self.visible.unwrap_or(0) / 4).max(1);
        self.offset_from_end = self.offset_from_end.saturating_sub(step);
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Welcome,
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Selection
    pub tickers: TickerSet,
    pub ticker_index: usize,
    pub bounds: HorizonBounds,
    pub years: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,

    // Pipeline
    pub pipeline: Pipeline,
    pub pending: Option<RunKind>,
    pub load_state: LoadState,
    pub output: Option<Arc<PipelineOutput>>,
    pub last_error: Option<String>,
    pub raw_window: ChartWindow,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,

    pub state_path: PathBuf,
}

impl AppState {
    pub fn new(
        pipeline: Pipeline,
        tickers: TickerSet,
        bounds: HorizonBounds,
        (start, end): (NaiveDate, NaiveDate),
        state_path: PathBuf,
    ) -> Self {
        Self {
            active_panel: Panel::Raw,
            running: true,
            tickers,
            ticker_index: 0,
            bounds,
            years: bounds.min_years,
            start,
            end,
            pipeline,
            pending: None,
            load_state: LoadState::Idle,
            output: None,
            last_error: None,
            raw_window: ChartWindow::default(),
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
            state_path,
        }
    }

    pub fn ticker(&self) -> Option<&Ticker> {
        self.tickers.get(self.ticker_index)
    }

    pub fn select_ticker(&mut self, ticker: &Ticker) -> bool {
        match self.tickers.position(ticker) {
            Some(i) => {
                self.ticker_index = i;
                true
            }
            None => false,
        }
    }

    pub fn next_ticker(&mut self) {
        if !self.tickers.is_empty() {
            self.switch_ticker((self.ticker_index + 1) % self.tickers.len());
        }
    }

    pub fn prev_ticker(&mut self) {
        if !self.tickers.is_empty() {
            let n = self.tickers.len();
            self.switch_ticker((self.ticker_index + n - 1) % n);
        }
    }

    /// Panels must not show the previous ticker's results while loading.
    fn switch_ticker(&mut self, index: usize) {
        self.ticker_index = index;
        self.output = None;
        self.last_error = None;
        self.raw_window.reset();
        self.request_run(RunKind::Run);
    }

    /// Move the horizon slider by `delta` years, clamped to the bounds.
    pub fn adjust_years(&mut self, delta: i32) {
        let target = (self.years as i64 + delta as i64).max(0) as u32;
        let clamped = self.bounds.clamp(target);
        if clamped != self.years {
            self.years = clamped;
            self.request_run(RunKind::Run);
        } else if delta != 0 {
            self.set_warning(format!(
                "Years of prediction range is {}-{}",
                self.bounds.min_years, self.bounds.max_years
            ));
        }
    }

    pub fn set_years(&mut self, years: u32) {
        self.years = self.bounds.clamp(years);
    }

    /// Queue a pipeline run; the next frame shows "Loading data...".
    pub fn request_run(&mut self, kind: RunKind) {
        // A queued refresh is not downgraded by a later plain run
        if self.pending != Some(RunKind::Refresh) {
            self.pending = Some(kind);
        }
        self.load_state = LoadState::Loading;
    }

    pub fn current_request(&self) -> Option<PipelineRequest> {
        let ticker = self.ticker()?.clone();
        let horizon = Horizon::new(self.bounds.clamp(self.years), self.bounds).ok()?;
        Some(PipelineRequest {
            ticker,
            horizon,
            start: self.start,
            end: self.end,
        })
    }

    /// Run queued pipeline work synchronously.
    pub fn execute_pending(&mut self) {
        let Some(kind) = self.pending.take() else {
            return;
        };
        let Some(request) = self.current_request() else {
            self.load_state = LoadState::Failed;
            self.push_error(
                ErrorCategory::Other,
                "no ticker selected".into(),
                String::new(),
            );
            return;
        };

        let result = match kind {
            RunKind::Run => self.pipeline.run(&request),
            RunKind::Refresh => self.pipeline.refresh(&request),
        };

        match result {
            Ok(output) => {
                self.load_state = LoadState::Done;
                self.last_error = None;
                self.set_status(format!(
                    "{}: {} observations ({}), {} forecast rows",
                    output.ticker,
                    output.observations().len(),
                    output.source().label(),
                    output.forecast.rows.len()
                ));
                self.output = Some(output);
            }
            Err(e) => {
                tracing::warn!(ticker = %request.ticker, error = %e, "pipeline run failed");
                let message = e.to_string();
                self.load_state = LoadState::Failed;
                self.output = None;
                self.last_error = Some(message.clone());
                self.push_error(
                    ErrorCategory::of(&e),
                    message,
                    format!("{} / {}", request.ticker, request.horizon),
                );
            }
        }
    }

    /// Push an error to the history, capping at `ERROR_HISTORY_CAP`.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}
