//! Terminal input conversion.
//!
//! Turns crossterm events into [`KeyInput`]s and [`AppEvent`]s. Terminals
//! report files dragged onto the window as pasted paths, so a paste made
//! only of existing files becomes a drop.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use entropy_app::{AppEvent, KeyInput};

/// Convert a crossterm key press to `KeyInput`.
///
/// Ctrl+C maps to Esc (quit) since raw mode swallows the signal.
pub fn convert_key(event: KeyEvent) -> Option<KeyInput> {
    if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
        return Some(KeyInput::Esc);
    }

    match event.code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Delete => Some(KeyInput::Delete),
        KeyCode::Tab => Some(KeyInput::Tab),
        KeyCode::BackTab => Some(KeyInput::BackTab),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::PageUp => Some(KeyInput::PageUp),
        KeyCode::PageDown => Some(KeyInput::PageDown),
        KeyCode::Home => Some(KeyInput::Home),
        KeyCode::End => Some(KeyInput::End),
        _ => None,
    }
}

/// Event for pasted text: a file drop if every line names an existing file,
/// a plain paste otherwise.
pub fn paste_event(text: String) -> AppEvent {
    let paths: Vec<PathBuf> =
        text.lines().map(str::trim).filter(|line| !line.is_empty()).map(dropped_path).collect();

    if !paths.is_empty() && paths.iter().all(|path| path.is_file()) {
        tracing::debug!(files = paths.len(), "paste recognized as file drop");
        AppEvent::FilesDropped { paths }
    } else {
        AppEvent::Paste(text)
    }
}

/// Undo the quoting terminals apply to dropped paths.
fn dropped_path(line: &str) -> PathBuf {
    let unquoted = line
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .or_else(|| line.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')))
        .unwrap_or(line);
    let path = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    PathBuf::from(path.replace("\\ ", " "))
}
