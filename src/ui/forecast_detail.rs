//! Forecast detail screen
//!
//! Shows every reading of one forecast record. UV is omitted for records
//! that don't carry it.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use metforecast::app::App;
use metforecast::data::NormalizedForecast;

use super::colors;

/// Renders the detail screen into `area`
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(view) = app.detail_view() else {
        return;
    };
    let forecast = &view.forecast;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER))
        .title(Span::styled(
            format!(" {} - {} ", view.location_name, forecast.title()),
            Style::default()
                .fg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        ));

    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            format!("  {}", forecast.weather()),
            Style::default()
                .fg(colors::HEADER)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    lines.extend(detail_lines(forecast));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn detail_lines(forecast: &NormalizedForecast) -> Vec<Line<'static>> {
    let mut rows = vec![
        ("Temperature", format!("{}°C", forecast.temperature)),
        ("Feels like", format!("{}°C", forecast.feels_like_temp)),
        ("Rain", format!("{}% chance", forecast.precipitation)),
        ("Humidity", format!("{}%", forecast.humidity)),
        (
            "Wind",
            format!("{}mph {}", forecast.wind_speed, forecast.wind_direction),
        ),
        ("Gusts", format!("{}mph", forecast.gust_speed)),
        ("Visibility", visibility_description(&forecast.visibility).to_string()),
    ];
    if !forecast.uv.is_empty() {
        rows.push(("UV index", forecast.uv.clone()));
    }

    rows.into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(
                    format!("  {:<14}", label),
                    Style::default().fg(colors::SECONDARY),
                ),
                Span::styled(value, Style::default().fg(colors::PRIMARY)),
            ])
        })
        .collect()
}

/// Expands a DataPoint visibility code, passing unknown values through
fn visibility_description(code: &str) -> &str {
    match code {
        "UN" => "Unknown",
        "VP" => "Very poor",
        "PO" => "Poor",
        "MO" => "Moderate",
        "GO" => "Good",
        "VG" => "Very good",
        "EX" => "Excellent",
        other => other,
    }
}
