//! Chat area
//!
//! Displays the open room's messages: avatar, sender, time and body, with
//! big emoji and image previews.

use entropy_app::{App, DropOperation, ListSurface, Pane, RowView};
use entropy_core::RenderKind;
use entropy_store::Store;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

/// Render the chat area.
pub fn render<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let chat = app.chat();

    let mut title =
        chat.room().map_or_else(|| " No Room ".to_string(), |room| format!(" #{} ", room.smart_name()));
    if app.drop_operation() == DropOperation::Copy {
        title.push_str("(drop to upload) ");
    }

    let border_style = if app.focus() == Pane::Chat {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default().borders(Borders::ALL).border_style(border_style).title(title);

    let placeholder = if chat.room().is_none() {
        Some("Select a room to start chatting")
    } else if chat.is_degraded() {
        Some("Messages are unavailable right now")
    } else if chat.list().row_count() == 0 {
        Some("No messages yet")
    } else {
        None
    };

    let items: Vec<ListItem> = match placeholder {
        Some(text) => {
            vec![ListItem::new(Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))))]
        },
        None => chat.list().views().map(message_item).collect(),
    };

    let list = List::new(items).block(block).highlight_style(if app.focus() == Pane::Chat {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    });

    let selected = if placeholder.is_none() { chat.list().selected_row() } else { None };
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

/// Two lines per message: header (avatar, sender, time) and body.
fn message_item(view: &RowView) -> ListItem<'static> {
    let avatar = view
        .avatar
        .as_ref()
        .map_or_else(|| "[ ]".to_string(), |media| format!("[{}]", String::from_utf8_lossy(&media.data)));

    let mut header = vec![
        Span::styled(avatar, Style::default().fg(Color::Cyan)),
        Span::raw(" "),
        Span::styled(
            view.title.clone(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(time) = &view.time {
        header.push(Span::raw(" "));
        header.push(Span::styled(time.clone(), Style::default().fg(Color::DarkGray)));
    }

    let body_style = if view.big_emoji {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let mut body = vec![Span::raw("    "), Span::styled(view.body.clone(), body_style)];
    if view.kind == RenderKind::Image {
        let preview = view.thumbnail.as_ref().map_or_else(
            || " [image]".to_string(),
            |thumbnail| format!(" [image, {} bytes]", thumbnail.len()),
        );
        body.push(Span::styled(preview, Style::default().fg(Color::Magenta)));
    }

    ListItem::new(vec![Line::from(header), Line::from(body)])
}
