//! Panel 3: forecast components (trend, weekly, yearly).

use chrono::{NaiveDate, Weekday};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use stockcast_runner::PipelineOutput;

use crate::theme;
use crate::ui::{date_labels, date_x, value_labels, y_bounds};

pub fn render(f: &mut Frame, area: Rect, output: &PipelineOutput) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    render_trend(f, chunks[0], output);

    match &output.forecast.profiles.weekly {
        Some(profile) => render_weekly(f, chunks[1], profile),
        None => render_missing(f, chunks[1], "weekly"),
    }
    match &output.forecast.profiles.yearly {
        Some(profile) => render_yearly(f, chunks[2], profile),
        None => render_missing(f, chunks[2], "yearly"),
    }
}

fn render_trend(f: &mut Frame, area: Rect, output: &PipelineOutput) {
    let forecast = &output.forecast;
    let c = &forecast.components;
    let (Some(first), Some(last)) = (forecast.rows.first(), forecast.rows.last()) else {
        return;
    };
    let xs: Vec<f64> = forecast.rows.iter().map(|r| date_x(r.timestamp)).collect();
    let zip = |v: &[f64]| -> Vec<(f64, f64)> { xs.iter().copied().zip(v.iter().copied()).collect() };
    let trend = zip(&c.trend);
    let lower = zip(&c.trend_lower);
    let upper = zip(&c.trend_upper);
    let bounds = y_bounds(&[&trend, &lower, &upper]);

    let datasets = vec![
        Dataset::default()
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
            .name("trend")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme::accent())
            .data(&trend),
    ];
    let x_min = date_x(first.timestamp);
    let chart = Chart::new(datasets)
        .block(Block::default().title(Span::styled("Trend", theme::muted())))
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([x_min, date_x(last.timestamp).max(x_min + 1.0)])
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

fn render_weekly(f: &mut Frame, area: Rect, profile: &[(Weekday, f64)]) {
    let data: Vec<(f64, f64)> = profile
        .iter()
        .enumerate()
        .map(|(i, &(_, effect))| (i as f64, effect))
        .collect();
    let bounds = y_bounds(&[&data]);
    let labels: Vec<Span> = profile
        .iter()
        .map(|(day, _)| Span::styled(day.to_string(), theme::muted()))
        .collect();

    let chart = Chart::new(vec![Dataset::default()
        .name("weekly")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme::neutral())
        .data(&data)])
    .block(Block::default().title(Span::styled("Weekly", theme::muted())))
    .x_axis(
        Axis::default()
            .style(theme::muted())
            .bounds([0.0, (profile.len().max(2) - 1) as f64])
            .labels(labels),
    )
    .y_axis(
        Axis::default()
            .style(theme::muted())
            .bounds(bounds)
            .labels(value_labels(bounds)),
    );
    f.render_widget(chart, area);
}

fn render_yearly(f: &mut Frame, area: Rect, profile: &[(u32, f64)]) {
    let data: Vec<(f64, f64)> = profile
        .iter()
        .map(|&(day, effect)| (day as f64, effect))
        .collect();
    let bounds = y_bounds(&[&data]);
    let labels: Vec<Span> = [(1, 1), (4, 1), (7, 1), (10, 1), (12, 31)]
        .into_iter()
        .filter_map(|(m, d)| NaiveDate::from_ymd_opt(2017, m, d))
        .map(|date| Span::styled(date.format("%b %d").to_string(), theme::muted()))
        .collect();

    let chart = Chart::new(vec![Dataset::default()
        .name("yearly")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme::neutral())
        .data(&data)])
    .block(Block::default().title(Span::styled("Yearly", theme::muted())))
    .x_axis(
        Axis::default()
            .style(theme::muted())
            .bounds([1.0, 365.0])
            .labels(labels),
    )
    .y_axis(
        Axis::default()
            .style(theme::muted())
            .bounds(bounds)
            .labels(value_labels(bounds)),
    );
    f.render_widget(chart, area);
}

fn render_missing(f: &mut Frame, area: Rect, name: &str) {
    let lines = vec![
        Line::from(Span::styled(
            format!("{}{}", name[..1].to_uppercase(), &name[1..]),
            theme::muted(),
        )),
        Line::from(Span::styled(
            format!("No {name} seasonality: history too short or disabled in config."),
            theme::secondary(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}
