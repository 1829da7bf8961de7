use ratatui::{
    backend::Backend,
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use crate::app::App;

const MESSAGE_TIMEOUT_SECS: u64 = 5;

pub fn draw_status_bar<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let expired = app
        .status_message
        .as_ref()
        .is_some_and(|(_, timestamp)| timestamp.elapsed().as_secs() >= MESSAGE_TIMEOUT_SECS);
    if expired {
        app.clear_status_message();
    }

    let Some((message, _)) = &app.status_message else {
        // Nothing to report: show where we are and what is running
        let idle = format!(
            "{}| {} running ",
            crate::ui::view_title(app),
            app.launcher.live_count()
        );
        let paragraph = Paragraph::new(idle)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    };

    let lower = message.to_lowercase();
    let style = if lower.contains("error") || lower.contains("failed") {
        Style::default().fg(Color::Red)
    } else if lower.contains("started") || lower.contains("copied") || lower.contains("reloaded") {
        Style::default().fg(Color::Green)
    } else if lower.contains("ended") {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Yellow)
    };

    let paragraph = Paragraph::new(message.as_str())
        .style(style)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}
