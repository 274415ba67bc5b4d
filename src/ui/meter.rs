use chrono::{DateTime, Local, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use daytripper::{meter::Phase, trip_log::TripRecord, util::format_money};

use crate::App;

fn local_timestamp(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Pure presenter for one row of the trip table
pub fn present_row(trip: &TripRecord) -> Row<'static> {
    Row::new(vec![
        Cell::from(trip.index.to_string()),
        Cell::from(format_money(trip.fare)),
        Cell::from(format_money(trip.extra)),
        Cell::from(format_money(trip.total())).style(Style::default().fg(Color::Green)),
        Cell::from(local_timestamp(trip.started_at)),
        Cell::from(local_timestamp(trip.ended_at)),
    ])
}

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // fare / extra / duration
            Constraint::Length(1), // session total
            Constraint::Min(3),    // trip table
        ])
        .split(area);

    let reading = app.meter.reading();
    let phase = app.meter.phase();
    let phase_style = match phase {
        Phase::Idle => Style::default().fg(Color::Gray),
        Phase::Active => Style::default().fg(Color::Green),
        Phase::Paused => Style::default().fg(Color::Yellow),
    };

    let label = Style::default().add_modifier(Modifier::BOLD);
    let display = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("FARE      ", label),
            Span::raw(format!("$ {:>9}", format_money(reading.fare))),
        ]),
        Line::from(vec![
            Span::styled("EXTRA     ", label),
            Span::raw(format!("$ {:>9}", format_money(reading.extra))),
        ]),
        Line::from(vec![
            Span::styled("DURATION  ", label),
            Span::raw(format!("  {:>9}", reading.duration_display())),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!("Trip ({phase})"), phase_style)),
    );
    display.render(chunks[0], buf);

    let log = app.meter.log();
    Paragraph::new(format!(
        "{} trip(s) / ${} earned / ${:.2}/h",
        log.len(),
        format_money(log.total_earnings()),
        app.meter.hourly_rate()
    ))
    .style(Style::default().fg(Color::Cyan))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    if log.is_empty() {
        Paragraph::new("No trips recorded yet.")
            .block(Block::default().borders(Borders::ALL).title("Trips"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        return;
    }

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Fare ($)"),
        Cell::from("Extra ($)"),
        Cell::from("Total ($)"),
        Cell::from("Start Time"),
        Cell::from("End Time"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(
        log.iter().map(present_row),
        &[
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(20),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Trips"));

    Widget::render(table, chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use crate::ui::tests::{render_to_string, test_app};
    use crate::Screen;

    #[test]
    fn test_idle_meter() {
        let app = test_app(Screen::Meter);
        let rendered = render_to_string(&app, 100, 30);

        assert!(rendered.contains("Trip (idle)"));
        assert!(rendered.contains("FARE"));
        assert!(rendered.contains("0.00"));
        assert!(rendered.contains("00:00:00"));
        assert!(rendered.contains("No trips recorded yet."));
        assert!(rendered.contains("$20.88/h"));
    }

    #[test]
    fn test_logged_trips_fill_table() {
        let mut app = test_app(Screen::Meter);
        for _ in 0..2 {
            app.meter.track().unwrap();
            app.meter.end_trip().unwrap();
        }
        let rendered = render_to_string(&app, 100, 30);

        assert!(rendered.contains("Fare ($)"));
        assert!(rendered.contains("Total ($)"));
        assert!(rendered.contains("2 trip(s)"));
        assert!(!rendered.contains("No trips recorded yet."));
    }

    #[test]
    fn test_phase_in_title() {
        let mut app = test_app(Screen::Meter);
        app.meter.track().unwrap();
        assert!(render_to_string(&app, 100, 30).contains("Trip (active)"));
        app.meter.pause().unwrap();
        assert!(render_to_string(&app, 100, 30).contains("Trip (paused)"));
    }
}
