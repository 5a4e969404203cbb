//! Location search screen
//!
//! A query box above a table of matching sites. Rows are already filtered
//! and ranked by the app; this only draws the window around the cursor.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use metforecast::app::App;

use super::{colors, row_styles, visible_window};

const NAME_WIDTH: usize = 40;
const ID_WIDTH: usize = 10;

/// Renders the search screen into `area`
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.search_view();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query box
            Constraint::Min(3),    // Results
        ])
        .split(area);

    let query = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(colors::HEADER)),
        Span::styled(view.query.to_string(), Style::default().fg(colors::PRIMARY)),
        Span::styled("_", Style::default().fg(colors::MUTED)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::HEADER))
            .title(" Search locations "),
    );
    frame.render_widget(query, chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::MUTED))
        .title(format!(" {} matches ", view.rows.len()));
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    let mut lines = vec![Line::from(Span::styled(
        format!(
            "  {:<name$}{:<id$}{}",
            "Name",
            "ID",
            "Region",
            name = NAME_WIDTH,
            id = ID_WIDTH
        ),
        Style::default()
            .fg(colors::SECONDARY)
            .add_modifier(Modifier::BOLD),
    ))];

    if view.rows.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No matching locations",
            Style::default().fg(colors::MUTED),
        )));
    }

    let height = inner.height.saturating_sub(1) as usize;
    for index in visible_window(view.selected, view.rows.len(), height) {
        let row = view.rows[index];
        let (cursor, style) = row_styles(index == view.selected);
        lines.push(Line::from(vec![
            Span::styled(cursor, style),
            Span::styled(
                format!(
                    "{:<name$}{:<id$}{}",
                    truncate(&row.name, NAME_WIDTH - 1),
                    row.id,
                    row.region,
                    name = NAME_WIDTH,
                    id = ID_WIDTH
                ),
                style,
            ),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Shortens `s` to at most `max` characters
fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
