//! Rooms sidebar
//!
//! Draws the sidebar's row views with the selected room highlighted.

use entropy_app::{App, ListSurface, Pane};
use entropy_store::Store;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState},
};

const SELECTED_PREFIX: &str = ">";

/// Render the rooms sidebar.
pub fn render<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let sidebar = app.sidebar();

    let items: Vec<ListItem> =
        sidebar.list().views().map(|view| ListItem::new(Line::from(view.title.clone()))).collect();

    let (title, title_style) = if sidebar.is_degraded() {
        (" Rooms (unavailable) ", Style::default().fg(Color::Red))
    } else {
        (" Rooms ", Style::default())
    };
    let border_style = if app.focus() == Pane::Sidebar {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Line::styled(title, title_style));
    let list = List::new(items)
        .block(block)
        .highlight_symbol(SELECTED_PREFIX)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let mut state = ListState::default().with_selected(sidebar.list().selected_row());
    frame.render_stateful_widget(list, area, &mut state);
}
