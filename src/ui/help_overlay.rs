//! Help overlay showing all keybindings
//!
//! Renders a centered modal overlay with keyboard shortcuts.

use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use metforecast::app::AppState;

use super::{centered_rect, colors};

/// Renders the help overlay on top of the current view
pub fn render(frame: &mut Frame, state: AppState) {
    let area = frame.area();

    // Calculate centered overlay area
    let overlay_width = 50;
    let overlay_height = 22;
    let overlay_area = centered_rect(overlay_width, overlay_height, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let current = match state {
        AppState::Search => "Search",
        AppState::LocationList => "Forecast list",
        AppState::ForecastDetail => "Forecast detail",
    };

    let lines = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(colors::HEADER)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Search"),
        help_line("type", "Filter locations"),
        help_line("↑, ↓", "Move selection up/down"),
        help_line("Enter", "Open location forecast"),
        help_line("Esc", "Clear search"),
        Line::from(""),
        section("Forecasts"),
        help_line("↑/k, ↓/j", "Move selection up/down"),
        help_line("Enter", "Open forecast details"),
        help_line("r", "Switch daily / 3-hourly"),
        help_line("Esc", "Go back"),
        Line::from(""),
        section("Other"),
        help_line("?", "Toggle this help"),
        help_line("q, Ctrl+C", "Quit application"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().fg(colors::MUTED),
        )),
    ];

    let block = Block::default()
        .title(format!(" Help: {} ", current))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, overlay_area);
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(vec![Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    )])
}

/// Creates a help line with key and description
fn help_line(key: &str, description: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", key), Style::default().fg(colors::KEY)),
        Span::raw(description.to_string()),
    ])
}
