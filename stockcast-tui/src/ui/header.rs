//! Header: title, ticker selector, horizon slider, load state.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, LoadState};
use crate::theme;
use crate::ui::widgets::Slider;

/// Rows including borders.
pub const HEIGHT: u16 = 5;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::muted())
        .title(" Stock Prediction App ")
        .title_style(theme::accent_bold());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    // Ticker selector
    let mut spans = vec![Span::styled("Select dataset for prediction: ", theme::muted())];
    for (i, ticker) in app.tickers.tickers().iter().enumerate() {
        let style = if i == app.ticker_index {
            theme::selected()
        } else {
            theme::secondary()
        };
        spans.push(Span::styled(format!(" {ticker} "), style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), rows[0]);

    // Horizon slider
    let mut slider =
        Slider::new("Years of prediction:", app.years, app.bounds.min_years, app.bounds.max_years);
    if app.load_state == LoadState::Loading {
        slider = slider.knob_style(theme::warning());
    }
    f.render_widget(slider, rows[1]);

    // Load state
    let style = match app.load_state {
        LoadState::Loading => theme::warning(),
        LoadState::Done => theme::positive(),
        LoadState::Failed => theme::negative(),
        LoadState::Idle => theme::muted(),
    };
    f.render_widget(
        Paragraph::new(Span::styled(app.load_state.text(), style)),
        rows[2],
    );
}
