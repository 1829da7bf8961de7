use crate::app::{ActivePanel, App, InputMode, Popup, View};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

pub fn draw_footer<B: Backend>(f: &mut Frame, app: &App, area: Rect) {
    let footer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let (nav_text, action_text) = match (&app.popup, app.input_mode, app.view) {
        (Some(Popup::ConfirmKill(_)), _, _) => ("Terminate the process?", "[y] Yes  [n] No"),
        (Some(Popup::Error { .. }), _, _) => ("", "[Enter] Close"),
        (None, InputMode::Help, _) => ("↑/k: Up  ↓/j: Down", "[Esc] Close help"),
        (None, InputMode::Search, _) => ("↑: Up  ↓: Down  [Enter] Go to host", "[Esc] Exit Search  Type to filter"),
        (None, InputMode::Normal, View::Hosts) if app.active_panel == ActivePanel::Associations => (
            "↑/k: Up  ↓/j: Down  [Enter] Launch  [y] Copy",
            "[e] Edit [s] Search [?] Help [q] Quit",
        ),
        (None, InputMode::Normal, View::Hosts) => (
            "↑/k: Up  ↓/j: Down  [Tab] Panel  [Enter] Open",
            "[e] Edit [s] Search [?] Help [q] Quit",
        ),
        (None, InputMode::Normal, View::Processes) => (
            "↑/k: Up  ↓/j: Down  [Enter] Details",
            "[z] Pause [r] Resume [x] Kill [1] Hosts",
        ),
        (None, InputMode::Normal, View::Debug) => ("↑/k: Up  ↓/j: Down", "[c] Clear [1] Hosts [q] Quit"),
    };

    let nav_help = Paragraph::new(nav_text).style(Style::default().fg(Color::Gray));
    let action_help = Paragraph::new(action_text)
        .style(Style::default().fg(if app.popup.is_some() { Color::Yellow } else { Color::Gray }))
        .alignment(Alignment::Right);

    f.render_widget(nav_help, footer[0]);
    f.render_widget(action_help, footer[1]);
}
