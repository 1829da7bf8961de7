use ratatui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::app::App;
use crate::model::{StatusIcon, TIMESTAMP_FORMAT};

fn icon_color(icon: Option<StatusIcon>) -> Color {
    match icon {
        Some(StatusIcon::Start) => Color::Green,
        Some(StatusIcon::Pause) => Color::Yellow,
        Some(StatusIcon::Stop) | None => Color::Gray,
    }
}

/// Every launched process, newest last. Expanded records list their
/// detail rows underneath.
pub fn draw<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let mut items = Vec::new();
    let mut selected_line = None;

    for (i, record) in app.launcher.records().iter().enumerate() {
        let is_selected = i == app.selected_process;
        if is_selected {
            selected_line = Some(items.len());
        }
        let expanded = app.expanded_processes.contains(&record.id);
        let running = app.launcher.is_running(record.id);

        let text_style = if is_selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let icon = record.icon();
        let spans = vec![
            Span::styled(if expanded { "▼ " } else { "▶ " }, text_style),
            Span::styled(
                format!("{} ", icon.map(|i| i.symbol()).unwrap_or(" ")),
                text_style.fg(if is_selected { Color::Black } else { icon_color(icon) }),
            ),
            Span::styled(format!("#{:<3} ", record.id), text_style.add_modifier(Modifier::BOLD)),
            Span::styled(format!("{} ", record.formatted_timestamp()), text_style),
            Span::styled(
                format!("{}/{} {} ", record.host, record.destination, record.service),
                text_style,
            ),
            Span::styled(format!("PID {} ", record.pid), text_style),
            Span::styled(
                record.status().to_string(),
                text_style.fg(if is_selected {
                    Color::Black
                } else if running {
                    Color::Cyan
                } else {
                    Color::Gray
                }),
            ),
        ];
        items.push(ListItem::new(Line::from(spans)));

        if expanded {
            items.push(ListItem::new(Line::from(Span::styled(
                format!("      $ {}", record.command),
                Style::default().fg(Color::Gray),
            ))));
            for detail in &record.details {
                items.push(ListItem::new(Line::from(vec![
                    Span::raw("      "),
                    Span::styled(
                        format!("{} ", detail.icon.symbol()),
                        Style::default().fg(icon_color(Some(detail.icon))),
                    ),
                    Span::styled(
                        format!("{} ", detail.timestamp.format(TIMESTAMP_FORMAT)),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::styled(detail.status.clone(), Style::default().fg(Color::White)),
                ])));
            }
        }
    }

    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            "No processes launched yet",
            Style::default().fg(Color::Gray),
        ))])
    } else {
        List::new(items)
    };

    let title = format!(
        "{}- {} running ",
        crate::ui::view_title(app),
        app.launcher.live_count()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(title);

    app.process_list_state.select(selected_line);
    f.render_stateful_widget(list.block(block), area, &mut app.process_list_state);
}
