use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use std::time::SystemTime;

use crate::app::{ActivePanel, App, InputMode};
use crate::model::{encode_arguments, Host};

pub fn draw<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(20), // Groups panel
                Constraint::Percentage(30), // Hosts panel
                Constraint::Percentage(50), // Host details
            ]
            .as_ref(),
        )
        .split(area);

    draw_groups_panel::<B>(f, app, chunks[0]);
    draw_hosts_panel::<B>(f, app, chunks[1]);
    draw_details_panel::<B>(f, app, chunks[2]);
}

fn panel_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    }
}

fn row_styles(selected: bool, accent: Color) -> (Style, Style) {
    if selected {
        (
            Style::default()
                .fg(Color::Black)
                .bg(accent)
                .add_modifier(Modifier::BOLD),
            Style::default().bg(accent),
        )
    } else {
        (Style::default().fg(Color::White), Style::default())
    }
}

fn draw_groups_panel<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let is_active = app.active_panel == ActivePanel::Groups && app.input_mode != InputMode::Search;
    let title = format!(" {} Groups ", if is_active { ">" } else { " " });

    let items: Vec<ListItem> = app
        .catalog
        .groups()
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let is_selected = i == app.selected_group;
            let (text_style, bg_style) = row_styles(is_selected && is_active, Color::Green);
            let prefix = if is_selected { "> " } else { "  " };
            let label_style = if is_selected && is_active {
                text_style
            } else {
                text_style.fg(Color::LightYellow).add_modifier(Modifier::BOLD)
            };
            let line = Line::from(vec![
                Span::styled(prefix, text_style),
                Span::styled(format!("[{}] {}", i + 1, group.display_name()), label_style),
            ]);
            ListItem::new(line).style(bg_style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(panel_style(is_active))
            .title(title),
    );
    f.render_stateful_widget(list, area, &mut app.group_list_state);
}

fn draw_hosts_panel<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    if app.input_mode == InputMode::Search {
        draw_search_results::<B>(f, app, area);
        return;
    }

    let is_active = app.active_panel == ActivePanel::Hosts;
    let hosts: Vec<Host> = app.current_hosts().into_iter().cloned().collect();
    let items: Vec<ListItem> = hosts
        .iter()
        .enumerate()
        .map(|(i, host)| {
            let is_selected = i == app.selected_host && is_active;
            let (text_style, bg_style) = row_styles(is_selected, Color::Green);
            let spans = vec![
                Span::styled(if is_selected { "> " } else { "  " }, text_style),
                Span::styled(
                    format!("[{}] ", i + 1),
                    text_style
                        .add_modifier(Modifier::BOLD)
                        .fg(if is_selected { Color::Black } else { Color::LightYellow }),
                ),
                Span::styled(host.name.clone(), text_style),
                Span::styled(
                    format!(" ({})", host.destinations.len()),
                    text_style.fg(if is_selected { Color::Black } else { Color::Gray }),
                ),
            ];
            ListItem::new(Line::from(spans)).style(bg_style)
        })
        .collect();

    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            "No hosts in this group",
            Style::default().fg(Color::Gray).not_italic(),
        ))])
    } else {
        List::new(items)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(panel_style(is_active))
        .title(format!(" {} Hosts ", if is_active { ">" } else { " " }));
    f.render_stateful_widget(list.block(block), area, &mut app.host_list_state);
}

fn draw_search_results<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let cursor = if now % 1000 < 500 { "█" } else { " " };
    let search = Paragraph::new(format!("{} {}", app.search_query, cursor))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search (Press 'Esc' to exit) ")
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(search, chunks[0]);

    let items: Vec<ListItem> = app
        .filtered_hosts
        .iter()
        .enumerate()
        .map(|(i, found)| {
            let is_selected = i == app.search_selected;
            let (text_style, bg_style) = row_styles(is_selected, Color::Yellow);
            let mut spans = vec![Span::styled(if is_selected { "> " } else { "  " }, text_style)];
            for (idx, c) in found.host.chars().enumerate() {
                let style = if found.matched_indices.contains(&idx) {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    text_style
                };
                spans.push(Span::styled(c.to_string(), style));
            }
            let group = if found.group.is_empty() { "default" } else { found.group.as_str() };
            spans.push(Span::styled(
                format!("  [{}]", group),
                text_style.fg(if is_selected { Color::Black } else { Color::Gray }),
            ));
            ListItem::new(Line::from(spans)).style(bg_style)
        })
        .collect();

    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            format!("No results for '{}'", app.search_query),
            Style::default().fg(Color::Gray),
        ))])
    } else {
        List::new(items)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Results ({} matches) ", app.filtered_hosts.len()));
    f.render_stateful_widget(list.block(block), chunks[1], &mut app.host_list_state);
}

fn draw_details_panel<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(host) = app.current_host().cloned() else {
        let block = Block::default().borders(Borders::ALL).title(" Details ");
        f.render_widget(Paragraph::new("Select a host").block(block), area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(host.destinations.len() as u16 + 4), Constraint::Min(3)].as_ref())
        .split(area);

    let mut lines = vec![
        Line::from(Span::styled(
            host.description.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for destination in host.destinations.values() {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", destination.name), Style::default().fg(Color::LightYellow)),
            Span::styled(destination.value.clone(), Style::default().fg(Color::Cyan)),
            Span::styled(format!("  {}", destination.kind), Style::default().fg(Color::Gray)),
        ]));
    }
    let info = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", host.name))
            .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    );
    f.render_widget(info, chunks[0]);

    let is_active = app.active_panel == ActivePanel::Associations && app.input_mode != InputMode::Search;
    let items: Vec<ListItem> = app
        .association_rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let is_selected = i == app.selected_association && is_active;
            let (text_style, bg_style) = row_styles(is_selected, Color::Green);
            let terminal = app
                .catalog
                .service(&row.service)
                .is_some_and(|service| service.terminal);
            let mut spans = vec![
                Span::styled(if is_selected { "> " } else { "  " }, text_style),
                Span::styled(row.service.clone(), text_style.add_modifier(Modifier::BOLD)),
                Span::styled(format!(" → {} ({})", row.destination, row.value), text_style),
            ];
            if !row.arguments.is_empty() {
                spans.push(Span::styled(
                    format!(" {}", encode_arguments(&row.arguments)),
                    text_style.fg(if is_selected { Color::Black } else { Color::Gray }),
                ));
            }
            if terminal {
                spans.push(Span::styled(" [terminal]", text_style.fg(Color::Magenta)));
            }
            ListItem::new(Line::from(spans)).style(bg_style)
        })
        .collect();

    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            "No associations",
            Style::default().fg(Color::Gray),
        ))])
    } else {
        List::new(items)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(panel_style(is_active))
        .title(format!(" {} Associations ", if is_active { ">" } else { " " }));
    f.render_stateful_widget(list.block(block), chunks[1], &mut app.association_list_state);
}
