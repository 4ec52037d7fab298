//! Overlay widgets: welcome and error history.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::centered_rect;

/// First-run welcome overlay.
pub fn render_welcome(f: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 50, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" Welcome to Stockcast ")
        .title_style(theme::accent_bold());

    let step = |s: &'static str| Line::from(Span::styled(s, theme::muted()));
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("Getting started:", theme::accent_bold())),
        Line::from(""),
        step("  1. Pick a ticker with j / k"),
        step("  2. Set the years of prediction with h / l"),
        step("  3. Browse raw data, forecast and components with 1-3"),
        step("  4. Press r to refetch prices from the provider"),
        Line::from(""),
        Line::from(Span::styled("Press any key to dismiss...", theme::neutral())),
    ];

    let para = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(para, popup);
}

/// Error history overlay.
pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(format!(
            " Error History ({}) [Esc]close [j/k]scroll ",
            app.error_history.len()
        ))
        .title_style(theme::negative());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.error_history.is_empty() {
        let text = Paragraph::new(Span::styled("No errors recorded.", theme::muted()));
        f.render_widget(text, inner);
        return;
    }

    let start = app.error_scroll.min(app.error_history.len() - 1);
    let end = (start + inner.height as usize).min(app.error_history.len());

    let mut lines: Vec<Line> = Vec::new();
    for (i, err) in app.error_history.range(start..end).enumerate() {
        let style = if i == 0 {
            theme::negative().add_modifier(Modifier::BOLD)
        } else {
            theme::muted()
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", err.timestamp.format("%H:%M:%S")),
                theme::muted(),
            ),
            Span::styled(format!("[{}] ", err.category.label()), theme::warning()),
            Span::styled(err.message.as_str(), style),
        ]));

        if !err.context.is_empty() {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(err.context.as_str(), theme::muted()),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
