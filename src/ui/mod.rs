//! UI rendering module for metforecast
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components. Screens only read the view
//! models exposed by [`App`].

pub mod forecast_detail;
pub mod forecast_list;
pub mod help_overlay;
pub mod search;

use std::ops::Range;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use metforecast::app::{App, AppState};

/// Color scheme shared by all screens
pub mod colors {
    use ratatui::style::Color;

    /// Borders and titles
    pub const HEADER: Color = Color::Cyan;
    /// Primary text
    pub const PRIMARY: Color = Color::White;
    /// Secondary/dimmed text
    pub const SECONDARY: Color = Color::Gray;
    /// Hints and separators
    pub const MUTED: Color = Color::DarkGray;
    /// Key names in hint lines
    pub const KEY: Color = Color::Yellow;
    /// Highlighted row
    pub const SELECTED: Color = Color::Cyan;
    pub const ERROR: Color = Color::Red;
}

/// Renders the whole frame for the current application state
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Active screen
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    match app.state {
        AppState::Search => search::render(frame, app, chunks[0]),
        AppState::LocationList => forecast_list::render(frame, app, chunks[0]),
        AppState::ForecastDetail => forecast_detail::render(frame, app, chunks[0]),
    }

    render_status_line(frame, app, chunks[1]);

    if let Some(label) = app.loading_label() {
        render_loading_popup(frame, label);
    }

    if app.show_help {
        help_overlay::render(frame, app.state);
    }
}

/// Renders a full-screen loading message while the sitelist is fetched
pub fn render_loading(frame: &mut Frame, message: &str) {
    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new(message.to_string())
        .style(Style::default().fg(colors::HEADER))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

/// Renders the error if there is one, otherwise key hints for the screen
fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.error {
        Some(error) => Line::from(Span::styled(
            format!(" {}", error),
            Style::default()
                .fg(colors::ERROR)
                .add_modifier(Modifier::BOLD),
        )),
        None => hint_line(app.state),
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn hint_line(state: AppState) -> Line<'static> {
    let hints: &[(&'static str, &'static str)] = match state {
        AppState::Search => &[
            ("type", "Filter"),
            ("↑/↓", "Navigate"),
            ("Enter", "Open"),
            ("Esc", "Clear"),
            ("Ctrl+C", "Quit"),
        ],
        AppState::LocationList => &[
            ("↑/↓", "Navigate"),
            ("Enter", "Details"),
            ("r", "Resolution"),
            ("Esc", "Back"),
            ("?", "Help"),
            ("q", "Quit"),
        ],
        AppState::ForecastDetail => &[("Esc", "Back"), ("?", "Help"), ("q", "Quit")],
    };

    let mut spans = vec![Span::raw(" ")];
    for (key, action) in hints {
        spans.push(Span::styled(*key, Style::default().fg(colors::KEY)));
        spans.push(Span::styled(
            format!(" {}  ", action),
            Style::default().fg(colors::MUTED),
        ));
    }
    Line::from(spans)
}

fn render_loading_popup(frame: &mut Frame, label: &str) {
    let text = format!("Loading {}...", label);
    let width = (text.chars().count() as u16 + 6).min(frame.area().width);
    let area = centered_rect(width, 3, frame.area());

    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(colors::PRIMARY))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors::HEADER)),
        );
    frame.render_widget(paragraph, area);
}

/// Helper function to create a centered rect
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

/// Range of list rows to draw so that `selected` stays on screen
pub fn visible_window(selected: usize, len: usize, height: usize) -> Range<usize> {
    if height == 0 || len == 0 {
        return 0..0;
    }
    let start = if selected >= height {
        selected + 1 - height
    } else {
        0
    };
    start..(start + height).min(len)
}

/// Cursor marker and style for a list row
pub fn row_styles(is_selected: bool) -> (&'static str, Style) {
    if is_selected {
        (
            "\u{25B8} ", // ▸
            Style::default()
                .fg(colors::SELECTED)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("  ", Style::default().fg(colors::PRIMARY))
    }
}
