use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use daytripper::form::{Field, Outcome};

use crate::App;

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(Field::ALL.len() as u16 + 2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let form = &app.form;
    let focused = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let lines: Vec<Line> = Field::ALL
        .iter()
        .map(|&field| {
            let is_focused = field == form.focus;
            let marker = if is_focused { "> " } else { "  " };
            let mut spans = vec![
                Span::styled(
                    format!("{marker}{:<12}", field.to_string()),
                    if is_focused {
                        focused
                    } else {
                        Style::default().add_modifier(Modifier::BOLD)
                    },
                ),
                Span::raw(format!("{:>10} {}", form.value(field), field.unit())),
            ];
            if field == Field::End && form.is_tracking_end() {
                spans.push(Span::styled(
                    "  TRACKING",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));
            }
            Line::from(spans)
        })
        .collect();

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Earnings"))
        .render(chunks[0], buf);

    let footer_style = match &form.outcome {
        None => Style::default().fg(Color::Gray),
        Some(Outcome::Earning(_)) => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Some(Outcome::Invalid(_)) => Style::default().fg(Color::Red),
    };
    Paragraph::new(Span::styled(form.summary(), footer_style))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}
