//! Row view model.
//!
//! A [`RowView`] is what a host draws for one row. Views are recycled: the
//! same view is reconfigured for different items as rows come and go, so
//! everything in it must be reset before it is configured again.

use entropy_core::RenderKind;

/// Media fetched for a row (avatar or thumbnail).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    /// Where the media came from.
    pub source: String,
    /// MIME type, if known.
    pub mimetype: Option<String>,
    /// Raw bytes.
    pub data: Vec<u8>,
}

impl Media {
    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the media has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Drawable state of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    /// Strategy tag the view was last configured with.
    pub kind: RenderKind,
    /// Heading: `#room` in the sidebar, sender name in the chat.
    pub title: String,
    /// Message body. Empty for rooms.
    pub body: String,
    /// Short time next to the title.
    pub time: Option<String>,
    /// Detailed time, shown on demand.
    pub tooltip: Option<String>,
    /// Body is drawn large.
    pub big_emoji: bool,
    /// Sender avatar, once fetched.
    pub avatar: Option<Media>,
    /// Image preview, once fetched.
    pub thumbnail: Option<Media>,
}

impl Default for RowView {
    fn default() -> Self {
        Self {
            kind: RenderKind::Text,
            title: String::new(),
            body: String::new(),
            time: None,
            tooltip: None,
            big_emoji: false,
            avatar: None,
            thumbnail: None,
        }
    }
}

impl RowView {
    /// Clear everything from a previous configuration.
    pub fn reset(&mut self, kind: RenderKind) {
        *self = Self { kind, ..Self::default() };
    }
}
