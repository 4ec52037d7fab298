//! Panel 1: raw data, tail table and Open/Close chart with a zoomable range.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Row, Table};
use ratatui::Frame;

use stockcast_core::domain::PriceObservation;
use stockcast_runner::{PipelineOutput, TAIL_ROWS};

use crate::app::ChartWindow;
use crate::theme;
use crate::ui::{date_labels, date_x, value_labels, y_bounds};

pub fn render(f: &mut Frame, area: Rect, output: &PipelineOutput, window: &ChartWindow) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(TAIL_ROWS as u16 + 3), Constraint::Min(5)])
        .split(area);

    render_table(f, chunks[0], output);
    render_chart(f, chunks[1], output.observations(), window);
}

fn render_table(f: &mut Frame, area: Rect, output: &PipelineOutput) {
    let header = Row::new(["Date", "Open", "High", "Low", "Close", "Volume"]).style(theme::accent_bold());
    let tail = output.raw_tail(TAIL_ROWS);
    let mut prev_close = output
        .observations()
        .len()
        .checked_sub(tail.len() + 1)
        .map(|i| output.observations()[i].close);

    let rows: Vec<Row> = tail
        .iter()
        .map(|o| {
            let close_style = match prev_close {
                Some(p) if p.is_finite() && o.close.is_finite() => {
                    Style::default().fg(theme::change_color(o.close - p))
                }
                _ => theme::text(),
            };
            prev_close = Some(o.close);
            Row::new(vec![
                Cell::from(o.date.to_string()),
                Cell::from(format!("{:.2}", o.open)),
                Cell::from(format!("{:.2}", o.high)),
                Cell::from(format!("{:.2}", o.low)),
                Cell::from(format!("{:.2}", o.close)).style(close_style),
                Cell::from(o.volume.to_string()),
            ])
            .style(theme::secondary())
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(theme::muted())
            .title(Span::styled(
                format!("{} ({}): last {TAIL_ROWS} rows", output.ticker, output.source().label()),
                theme::muted(),
            )),
    );
    f.render_widget(table, area);
}

fn render_chart(f: &mut Frame, area: Rect, observations: &[PriceObservation], window: &ChartWindow) {
    let range = window.range(observations.len());
    let visible = &observations[range.clone()];
    let (Some(first), Some(last)) = (visible.first(), visible.last()) else {
        return;
    };

    let series = |pick: fn(&PriceObservation) -> f64| -> Vec<(f64, f64)> {
        visible
            .iter()
            .filter(|o| pick(o).is_finite())
            .map(|o| (date_x(o.date), pick(o)))
            .collect()
    };
    let open = series(|o| o.open);
    let close = series(|o| o.close);
    let bounds = y_bounds(&[&open, &close]);

    let title = match window.visible {
        None => format!("Time Series data: all {} days [+/-]zoom", observations.len()),
        Some(_) => format!(
            "Time Series data: rows {}..{} of {} [+/-]zoom [,/.]pan [0]reset",
            range.start + 1,
            range.end,
            observations.len()
        ),
    };

    let datasets = vec![
        Dataset::default()
            .name("stock_open")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme::neutral())
            .data(&open),
        Dataset::default()
            .name("stock_close")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme::positive())
            .data(&close),
    ];

    let x_min = date_x(first.date);
    let x_max = date_x(last.date).max(x_min + 1.0);
    let chart = Chart::new(datasets)
        .block(Block::default().title(Span::styled(title, theme::muted())))
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([x_min, x_max])
                .labels(date_labels(first.date, last.date)),
        )
        .y_axis(
            Axis::default()
                .style(theme::muted())
                .bounds(bounds)
                .labels(value_labels(bounds)),
        );
    f.render_widget(chart, area);
}
