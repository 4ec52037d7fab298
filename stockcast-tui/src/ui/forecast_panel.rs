//! Panel 2: forecast tail table and forecast chart with uncertainty band.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Row, Table};
use ratatui::Frame;

use stockcast_runner::{PipelineOutput, TAIL_ROWS};

use crate::theme;
use crate::ui::{date_labels, date_x, value_labels, y_bounds};

pub fn render(f: &mut Frame, area: Rect, output: &PipelineOutput) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(TAIL_ROWS as u16 + 3), Constraint::Min(5)])
        .split(area);

    render_table(f, chunks[0], output);
    render_chart(f, chunks[1], output);
}

fn render_table(f: &mut Frame, area: Rect, output: &PipelineOutput) {
    let header =
        Row::new(["ds", "yhat", "yhat_lower", "yhat_upper"]).style(theme::accent_bold());
    let rows: Vec<Row> = output
        .forecast
        .tail(TAIL_ROWS)
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.timestamp.to_string()),
                Cell::from(format!("{:.4}", r.point_estimate)).style(theme::accent()),
                Cell::from(format!("{:.4}", r.lower_bound)),
                Cell::from(format!("{:.4}", r.upper_bound)),
            ])
            .style(theme::secondary())
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(theme::muted())
            .title(Span::styled(
                format!("Forecast data: {} over {}", output.ticker, output.horizon),
                theme::muted(),
            )),
    );
    f.render_widget(table, area);
}

fn render_chart(f: &mut Frame, area: Rect, output: &PipelineOutput) {
    let forecast = &output.forecast;
    let (Some(first), Some(last)) = (forecast.rows.first(), forecast.rows.last()) else {
        return;
    };

    let observed: Vec<(f64, f64)> = output
        .rows
        .iter()
        .map(|r| (date_x(r.timestamp), r.value))
        .collect();
    let yhat: Vec<(f64, f64)> = forecast
        .rows
        .iter()
        .map(|r| (date_x(r.timestamp), r.point_estimate))
        .collect();
    let lower: Vec<(f64, f64)> = forecast
        .rows
        .iter()
        .map(|r| (date_x(r.timestamp), r.lower_bound))
        .collect();
    let upper: Vec<(f64, f64)> = forecast
        .rows
        .iter()
        .map(|r| (date_x(r.timestamp), r.upper_bound))
        .collect();
    let bounds = y_bounds(&[&observed, &lower, &upper]);

    let band_label = format!("{:.0}% interval", forecast.interval_width * 100.0);
    let datasets = vec![
        Dataset::default()
            .name(band_label)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme::muted())
            .data(&lower),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme::muted())
            .data(&upper),
        Dataset::default()
            .name("observed")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(theme::text())
            .data(&observed),
        Dataset::default()
            .name("yhat")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme::accent())
            .data(&yhat),
    ];

    let x_min = date_x(first.timestamp);
    let x_max = date_x(last.timestamp).max(x_min + 1.0);
    let chart = Chart::new(datasets)
        .block(Block::default().title(Span::styled(
            format!("Forecast plot for {}", output.horizon),
            theme::muted(),
        )))
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([x_min, x_max])
                .labels(date_labels(first.timestamp, last.timestamp)),
        )
        .y_axis(
            Axis::default()
                .style(theme::muted())
                .bounds(bounds)
                .labels(value_labels(bounds)),
        );
    f.render_widget(chart, area);
}
