//! Login screen
//!
//! Three fields (username, password, homeserver) in a centered box, the
//! last error under them and the info line at the bottom.

use entropy_app::{App, LoginField};
use entropy_store::Store;
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const FORM_WIDTH: u16 = 60;
const FORM_HEIGHT: u16 = 11;
const LABEL_WIDTH: usize = 12;
const PASSWORD_MASK: char = '*';

/// Render the login screen.
pub fn render<S: Store>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let form = app.login();

    let [form_area] = Layout::horizontal([Constraint::Length(FORM_WIDTH)]).flex(Flex::Center).areas(area);
    let [form_area] = Layout::vertical([Constraint::Length(FORM_HEIGHT)]).flex(Flex::Center).areas(form_area);

    let masked: String = form.password().chars().map(|_| PASSWORD_MASK).collect();
    let mut lines = vec![
        Line::raw(""),
        field_line("Username", form.username(), form.focus() == LoginField::Username),
        field_line("Password", &masked, form.focus() == LoginField::Password),
        field_line("Homeserver", form.homeserver(), form.focus() == LoginField::Homeserver),
        Line::raw(""),
    ];

    if form.is_pending() {
        lines.push(Line::styled(" Logging in...", Style::default().fg(Color::Yellow)));
    } else if let Some(error) = form.error() {
        lines.push(Line::styled(format!(" {error}"), Style::default().fg(Color::Red)));
    } else {
        lines.push(Line::raw(""));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
        " Enter: log in  Tab: next field  Esc: quit",
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(Line::styled(format!(" {}", app.settings().info_line()), Style::default().fg(Color::DarkGray)));

    let block = Block::default().borders(Borders::ALL).title(format!(" {} ", app.settings().app_name));
    frame.render_widget(Paragraph::new(lines).block(block), form_area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let (marker, label_style) = if focused {
        (">", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else {
        (" ", Style::default())
    };
    Line::from(vec![
        Span::styled(format!("{marker}{label:<LABEL_WIDTH$}"), label_style),
        Span::raw(value.to_string()),
    ])
}
