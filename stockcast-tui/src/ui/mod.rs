//! Top-level UI layout: header, one panel, status bar.

pub mod components_panel;
pub mod forecast_panel;
pub mod header;
pub mod help_panel;
pub mod overlays;
pub mod raw_panel;
pub mod status_bar;
pub mod widgets;

use chrono::{Datelike, NaiveDate};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{AppState, LoadState, Overlay, Panel};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header::HEIGHT),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    header::render(f, chunks[0], app);
    draw_panel(f, chunks[1], app);
    status_bar::render(f, chunks[2], app);

    match app.overlay {
        Overlay::Welcome => overlays::render_welcome(f, chunks[1]),
        Overlay::ErrorHistory => overlays::render_error_history(f, chunks[1], app),
        Overlay::None => {}
    }
}

/// Draw the active panel with its border.
///
/// A failed run replaces every data panel with the error message.
fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} [{}] ", panel.label(), panel.index() + 1))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    if panel == Panel::Help {
        help_panel::render(f, inner);
        return;
    }

    if let Some(message) = &app.last_error {
        render_error(f, inner, message);
        return;
    }

    let Some(output) = &app.output else {
        render_placeholder(f, inner, app.load_state);
        return;
    };

    match panel {
        Panel::Raw => raw_panel::render(f, inner, output, &app.raw_window),
        Panel::Forecast => forecast_panel::render(f, inner, output),
        Panel::Components => components_panel::render(f, inner, output),
        Panel::Help => {}
    }
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Error", theme::negative())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme::text())),
        Line::from(""),
        Line::from(Span::styled(
            "Pick another ticker (j/k), press r to retry, or e for error history.",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn render_placeholder(f: &mut Frame, area: Rect, state: LoadState) {
    let text = match state {
        LoadState::Loading => "Loading data...",
        _ => "No data loaded yet. Press r to load the selected ticker.",
    };
    f.render_widget(
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(text, theme::muted())),
        ]),
        area,
    );
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

// ─── Chart helpers ──────────────────────────────────────────────────

/// Chart x coordinate for a date.
pub(crate) fn date_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// `[min, max]` over every finite y with 5% padding; `[0, 1]` when empty.
pub(crate) fn y_bounds(series: &[&[(f64, f64)]]) -> [f64; 2] {
    let (lo, hi) = series
        .iter()
        .flat_map(|s| s.iter())
        .map(|&(_, y)| y)
        .filter(|y| y.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    if lo > hi {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo).abs() * 0.05).max(1e-6);
    [lo - pad, hi + pad]
}

/// First, middle and last date as axis labels.
pub(crate) fn date_labels<'a>(first: NaiveDate, last: NaiveDate) -> Vec<Span<'a>> {
    let mid = first + (last - first) / 2;
    [first, mid, last]
        .into_iter()
        .map(|d| Span::styled(d.format("%Y-%m-%d").to_string(), theme::muted()))
        .collect()
}

pub(crate) fn value_labels<'a>(bounds: [f64; 2]) -> Vec<Span<'a>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .into_iter()
        .map(|v| Span::styled(format!("{v:.2}"), theme::muted()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RunKind;
    use crate::test_helpers::{app_with, Reply};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(app: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn y_bounds_pads_and_ignores_nan() {
        let a = [(0.0, 10.0), (1.0, f64::NAN), (2.0, 20.0)];
        let [lo, hi] = y_bounds(&[&a]);
        assert!((lo - 9.5).abs() < 1e-9);
        assert!((hi - 20.5).abs() < 1e-9);
        assert_eq!(y_bounds(&[]), [0.0, 1.0]);
    }

    #[test]
    fn header_shows_title_and_load_state() {
        let (mut app, _dir) = app_with(Reply::Prices);
        app.request_run(RunKind::Run);
        assert!(screen_text(&app).contains("Loading data..."));

        app.execute_pending();
        let text = screen_text(&app);
        assert!(text.contains("Stock Prediction App"));
        assert!(text.contains("Loading data... Done!"));
        assert!(text.contains("Years of prediction"));
        assert!(text.contains("AAPL"));
    }

    #[test]
    fn every_panel_renders_after_a_run() {
        let (mut app, _dir) = app_with(Reply::Prices);
        app.request_run(RunKind::Run);
        app.execute_pending();
        for panel in [Panel::Raw, Panel::Forecast, Panel::Components, Panel::Help] {
            app.active_panel = panel;
            let text = screen_text(&app);
            assert!(text.contains(panel.label()), "{panel:?}");
        }
        app.active_panel = Panel::Forecast;
        assert!(screen_text(&app).contains("yhat_lower"));
    }

    #[test]
    fn error_replaces_panels() {
        let (mut app, _dir) = app_with(Reply::Empty);
        app.request_run(RunKind::Run);
        app.execute_pending();
        app.active_panel = Panel::Forecast;
        let text = screen_text(&app);
        assert!(text.contains("no data found"));
        assert!(!text.contains("yhat_lower"));
    }
}
