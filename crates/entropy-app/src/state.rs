//! UI state that is not a list.

use unicode_segmentation::UnicodeSegmentation;

/// Which top-level screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Login form.
    #[default]
    Login,
    /// Sidebar and chat.
    Main,
}

/// Which part of the main screen receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    /// Room list.
    #[default]
    Sidebar,
    /// Message list and composer.
    Chat,
}

impl Pane {
    /// The other pane.
    pub fn toggle(self) -> Self {
        match self {
            Self::Sidebar => Self::Chat,
            Self::Chat => Self::Sidebar,
        }
    }
}

/// Backend sync state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Not syncing (logged out).
    #[default]
    Idle,
    /// Sync loop running.
    Syncing,
    /// Sync stopped with an error.
    Failed(String),
}

/// Message input line.
///
/// The cursor is a byte offset that always sits on a grapheme boundary, so
/// editing never splits a multi-codepoint emoji.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    buffer: String,
    cursor: usize,
}

impl Composer {
    /// Empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `c` at the cursor.
    pub fn insert(&mut self, c: char) {
        self.buffer.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert pasted text at the cursor. Newlines become spaces.
    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace(['\r', '\n'], " ");
        self.buffer.insert_str(self.cursor, &text);
        self.cursor += text.len();
    }

    /// Delete the grapheme before the cursor.
    pub fn backspace(&mut self) {
        let start = self.previous_boundary();
        self.buffer.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    /// Delete the grapheme at the cursor.
    pub fn delete(&mut self) {
        let end = self.next_boundary();
        self.buffer.replace_range(self.cursor..end, "");
    }

    /// Move the cursor one grapheme left.
    pub fn left(&mut self) {
        self.cursor = self.previous_boundary();
    }

    /// Move the cursor one grapheme right.
    pub fn right(&mut self) {
        self.cursor = self.next_boundary();
    }

    /// Cursor to start.
    pub fn home(&mut self) {
        self.cursor = 0;
    }

    /// Cursor to end.
    pub fn end(&mut self) {
        self.cursor = self.buffer.len();
    }

    /// Take the text for sending, leaving the composer empty.
    ///
    /// Returns `None` (and keeps the text) if it is blank.
    pub fn take(&mut self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            return None;
        }
        self.cursor = 0;
        Some(std::mem::take(&mut self.buffer))
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Cursor byte offset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Cursor position in graphemes, for placing the terminal cursor.
    pub fn cursor_column(&self) -> usize {
        self.buffer[..self.cursor].graphemes(true).count()
    }

    fn previous_boundary(&self) -> usize {
        self.buffer[..self.cursor].grapheme_indices(true).next_back().map_or(0, |(index, _)| index)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .graphemes(true)
            .next()
            .map_or(self.cursor, |grapheme| self.cursor + grapheme.len())
    }
}
