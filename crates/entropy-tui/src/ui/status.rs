//! Status bar
//!
//! Displays sync status, the logged-in user and the latest status message.

use entropy_app::{App, SyncState};
use entropy_store::Store;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let sync_status = match app.sync_state() {
        SyncState::Idle => Span::styled("Offline", Style::default().fg(Color::Red)),
        SyncState::Syncing => Span::styled(
            "Syncing",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        SyncState::Failed(_) => Span::styled("Sync failed", Style::default().fg(Color::Red)),
    };

    let user = app.session().map_or_else(String::new, |session| format!(" | {}", session.user_id));
    let message =
        app.status_message().map_or_else(String::new, |message| format!(" | {message}"));

    let status_line = Line::from(vec![
        Span::raw(" "),
        sync_status,
        Span::styled(user, Style::default().fg(Color::Gray)),
        Span::raw(message),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
