//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples the screens from terminal libraries so the whole app can be
/// driven from tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key (submit login, send message).
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Tab key (next field, or switch between sidebar and chat).
    Tab,
    /// Shift+Tab (previous field).
    BackTab,
    /// Escape key (quit).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Page up (scroll the chat).
    PageUp,
    /// Page down (scroll the chat).
    PageDown,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
}
