use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::App;

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let points = app.locations.points();
    let lines: Vec<Line> = if points.is_empty() {
        vec![Line::from(Span::styled(
            "No locations recorded yet.",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        // Newest at the bottom; keep the tail in view
        let visible = chunks[0].height.saturating_sub(2) as usize;
        let skip = points.len().saturating_sub(visible);
        points
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(idx, point)| Line::from(format!("Location {}: {}", idx + 1, point)))
            .collect()
    };

    let title = match app.geolocator.remaining() {
        Some(1) => "Recorded Locations (1 fix left)".to_string(),
        Some(n) => format!("Recorded Locations ({n} fixes left)"),
        None => "Recorded Locations".to_string(),
    };
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .render(chunks[0], buf);

    if let Some(km) = app.locations.last_distance() {
        Paragraph::new(Line::from(vec![
            Span::raw("Distance between last two locations: "),
            Span::styled(
                format!("{km:.2} km"),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .render(chunks[1], buf);
    }
}
