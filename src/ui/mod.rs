pub mod debug_console;
pub mod footer;
pub mod help_popup;
pub mod hosts_list;
pub mod popup;
pub mod processes;
pub mod status_bar;

use crate::app::{App, InputMode, View};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

pub fn draw<B: Backend>(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(3),    // Main content
                Constraint::Length(1), // Status bar
                Constraint::Length(1), // Footer
            ]
            .as_ref(),
        )
        .split(f.size());

    match app.view {
        View::Hosts => hosts_list::draw::<B>(f, app, chunks[0]),
        View::Processes => processes::draw::<B>(f, app, chunks[0]),
        View::Debug => debug_console::draw::<B>(f, app, chunks[0]),
    }
    status_bar::draw_status_bar::<B>(f, app, chunks[1]);
    footer::draw_footer::<B>(f, app, chunks[2]);

    if app.input_mode == InputMode::Help {
        help_popup::render_help_popup::<B>(f, app);
    }
    if app.popup.is_some() {
        popup::draw::<B>(f, app);
    }
}

/// A rectangle centered in `r`, sized in percent of it.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

/// Title of the tab-like header shared by the three views.
pub(crate) fn view_title(app: &App) -> String {
    let tab = |view: View, key: char, label: &str| {
        if app.view == view {
            format!("[{}] {} *", key, label)
        } else {
            format!("[{}] {}", key, label)
        }
    };
    format!(
        " {}  {}  {} ",
        tab(View::Hosts, '1', "Hosts"),
        tab(View::Processes, '2', "Processes"),
        tab(View::Debug, '3', "Debug")
    )
}
