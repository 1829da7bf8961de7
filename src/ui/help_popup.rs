use ratatui::{
    backend::Backend,
    layout::Margin,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation},
    Frame,
};

use crate::app::App;

pub fn render_help_popup<B: Backend>(f: &mut Frame, app: &mut App) {
    let block = Block::default()
        .title("Keyboard Shortcuts")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::White));

    let area = crate::ui::centered_rect(80, 80, f.size());
    f.render_widget(Clear, area); // this clears the background
    f.render_widget(block, area);

    let text = get_help_text();
    let line_count = text.lines.len();
    let inner_area = area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });

    let max_scroll = line_count.saturating_sub(inner_area.height as usize) as u16;
    app.help_scroll_position = app.help_scroll_position.min(max_scroll);

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::White))
        .scroll((app.help_scroll_position, 0));
    f.render_widget(paragraph, inner_area);

    // Make scrollbar only appear if there is overflow
    if line_count > inner_area.height as usize {
        let mut scrollbar_state =
            ratatui::widgets::ScrollbarState::new(line_count).position(app.help_scroll_position as usize);

        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓")),
            inner_area,
            &mut scrollbar_state,
        );
    }
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan),
    ))
}

fn entry<'a>(keys: &'a str, action: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", keys), Style::default().fg(Color::Green)),
        Span::raw(format!(" - {}", action)),
    ])
}

fn get_help_text<'a>() -> Text<'a> {
    Text::from(vec![
        section("Everywhere"),
        entry("q", "Quit"),
        entry("1, 2, 3", "Hosts, processes and debug views"),
        entry("p, d", "Processes view, debug view"),
        entry("R", "Reload the configuration"),
        entry("?", "Toggle help"),
        Line::from(""),
        section("Hosts View"),
        entry("Tab, →", "Next panel"),
        entry("S-Tab, ←", "Previous panel"),
        entry("j, ↓", "Move down"),
        entry("k, ↑", "Move up"),
        entry("Enter", "Open panel / launch the association"),
        entry("s, /", "Search hosts"),
        entry("e", "Edit the host file"),
        entry("y", "Copy the resolved command"),
        entry("r", "Reload"),
        Line::from(""),
        section("Search Mode"),
        entry("Esc", "Back to normal mode"),
        entry("Enter", "Go to the selected host"),
        entry("↑, ↓", "Move"),
        entry("Backspace", "Delete a character"),
        Line::from(""),
        section("Processes View"),
        entry("Enter", "Show or hide details"),
        entry("z", "Pause"),
        entry("r", "Resume"),
        entry("x", "Terminate"),
        Line::from(""),
        section("Debug View"),
        entry("j, k", "Scroll"),
        entry("c", "Clear the console"),
    ])
}
