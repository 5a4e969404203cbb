//! Forecast list screen
//!
//! One entry per forecast record of the loaded site, each drawn as a title
//! line and a dimmed summary line underneath.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use metforecast::app::App;

use super::{colors, row_styles, visible_window};

/// Lines used by each forecast entry, including the spacer
const ENTRY_HEIGHT: usize = 3;

/// Renders the forecast list into `area`
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(view) = app.location_view() else {
        render_no_data(frame, area);
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER))
        .title(Span::styled(
            format!(" {} ", view.header),
            Style::default()
                .fg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(
            format!(" {} forecast ", view.resolution),
            Style::default().fg(colors::SECONDARY),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let capacity = inner.height as usize / ENTRY_HEIGHT;
    let mut lines = Vec::with_capacity(capacity * ENTRY_HEIGHT);
    for index in visible_window(view.selected, view.items.len(), capacity) {
        let item = &view.items[index];
        let is_selected = index == view.selected;
        let (cursor, style) = row_styles(is_selected);

        lines.push(Line::from(vec![
            Span::styled(cursor, style),
            Span::styled(item.title.clone(), style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {}", item.summary),
            Style::default().fg(if is_selected {
                colors::SECONDARY
            } else {
                colors::MUTED
            }),
        )));
        lines.push(Line::default());
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_no_data(frame: &mut Frame, area: Rect) {
    let message = Paragraph::new(Span::styled(
        "No forecast loaded",
        Style::default().fg(colors::MUTED),
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(message, area);
}
