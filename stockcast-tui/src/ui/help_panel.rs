//! Panel 4: keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::theme;

pub fn render(f: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global");
    key(&mut lines, "1-4", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "?", "Show this panel");
    key(&mut lines, "q / Ctrl+C", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Selection");
    key(&mut lines, "j / k", "Next / previous ticker");
    key(&mut lines, "h / l", "One year less / more of prediction");
    key(&mut lines, "r", "Refresh: refetch prices and forecast again");
    lines.push(Line::from(""));

    section(&mut lines, "Raw data chart");
    key(&mut lines, "+ / -", "Zoom in / out");
    key(&mut lines, ", / .", "Pan back / forward in time");
    key(&mut lines, "0", "Show the full range");
    lines.push(Line::from(""));

    section(&mut lines, "Errors");
    key(&mut lines, "e", "Open error history overlay");
    key(&mut lines, "Esc", "Close overlay");

    f.render_widget(Paragraph::new(lines), area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>18}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
