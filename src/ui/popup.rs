use ratatui::{
    backend::Backend,
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Popup};

pub fn draw<B: Backend>(f: &mut Frame, app: &App) {
    let Some(popup) = &app.popup else {
        return;
    };

    let (title, accent, mut lines) = match popup {
        Popup::Error { title, message } => (
            title.clone(),
            Color::Red,
            message
                .lines()
                .map(|line| Line::from(Span::styled(line.to_string(), Style::default().fg(Color::White))))
                .collect::<Vec<_>>(),
        ),
        Popup::ConfirmKill(id) => {
            let command = app
                .launcher
                .record(*id)
                .map(|r| r.command.clone())
                .unwrap_or_default();
            (
                "Terminate the process".to_string(),
                Color::Yellow,
                vec![
                    Line::from(Span::styled(
                        format!("Terminate process #{}?", id),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(command, Style::default().fg(Color::Cyan))),
                ],
            )
        }
    };

    let hint = match popup {
        Popup::Error { .. } => "[Enter] Close",
        Popup::ConfirmKill(_) => "[y] Terminate  [n] Cancel",
    };
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        hint,
        Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
        .border_style(Style::default().fg(accent));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    let area = crate::ui::centered_rect(60, 30, f.size());
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}
