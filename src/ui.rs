pub mod calculator;
pub mod locations;
pub mod meter;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph, Tabs, Widget},
};

use daytripper::meter::Phase;

use crate::{App, Screen};

const HORIZONTAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(3), // tabs
                Constraint::Min(1),    // screen body
                Constraint::Length(1), // status
                Constraint::Length(1), // legend
            ])
            .split(area);

        let titles = Screen::ALL.iter().map(|s| s.to_string());
        Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Day Tripper"))
            .select(self.screen.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .render(chunks[0], buf);

        match self.screen {
            Screen::Meter => meter::render(self, chunks[1], buf),
            Screen::Calculator => calculator::render(self, chunks[1], buf),
            Screen::Locations => locations::render(self, chunks[1], buf),
        }

        if let Some(status) = &self.status {
            Paragraph::new(Span::styled(
                status.as_str(),
                Style::default().fg(Color::Yellow),
            ))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        }

        Paragraph::new(Span::styled(
            legend(self),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);
    }
}

fn legend(app: &App) -> String {
    let keys = match app.screen {
        Screen::Meter => {
            if app.meter.phase() == Phase::Paused {
                "(t)rack / (p) resume / (e)nd trip"
            } else {
                "(t)rack / (p)ause / (e)nd trip"
            }
        }
        Screen::Calculator => {
            if app.form.is_tracking_end() {
                "(↑/↓) field / (enter) calculate / (n)ow / (t) stop end time"
            } else {
                "(↑/↓) field / (enter) calculate / (n)ow / (t)rack end time"
            }
        }
        Screen::Locations => "(g)et current location",
    };
    format!("{keys} / (tab) switch / (esc)ape")
}
