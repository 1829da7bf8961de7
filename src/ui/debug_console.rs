use ratatui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::debug_log::Severity;

pub fn draw<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let lines: Vec<Line> = app
        .console
        .render(&app.preferences)
        .into_iter()
        .map(|(severity, text)| {
            let color = match severity {
                Severity::Info => Color::White,
                Severity::Warning => Color::Yellow,
                Severity::Error => Color::Red,
            };
            Line::styled(text, Style::default().fg(color))
        })
        .collect();

    // Keep the scroll inside the buffer
    let max_scroll = lines.len().saturating_sub(area.height.saturating_sub(2) as usize) as u16;
    app.debug_scroll = app.debug_scroll.min(max_scroll);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(crate::ui::view_title(app));
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.debug_scroll, 0))
        .block(block);
    f.render_widget(paragraph, area);
}
