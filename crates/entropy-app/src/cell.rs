//! Row configuration strategies.
//!
//! Every item carries a [`RenderKind`] tag; a [`CellRegistry`] maps tags to
//! [`CellConfigurator`]s that fill a [`RowView`] and name the async
//! enrichment (avatars, thumbnails) the row wants.

use std::{collections::HashMap, fmt, sync::Arc};

use entropy_core::RenderKind;
use entropy_store::{Message, Room, UserId};

use crate::{Formatters, RowView};

/// Async work a configured row asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentRequest {
    /// Avatar of a message sender.
    Avatar {
        /// Sender
        user_id: UserId,
    },
    /// Preview of an image message.
    Thumbnail {
        /// Image location
        url: String,
    },
}

/// Fills a [`RowView`] for one item.
pub trait CellConfigurator<T>: Send + Sync {
    /// Write `item` into a freshly reset `view`.
    ///
    /// Returns the enrichment the row needs.
    fn configure(
        &self,
        item: &T,
        view: &mut RowView,
        formatters: &Formatters,
    ) -> Vec<EnrichmentRequest>;
}

/// Sidebar row: `#smart_name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomCell;

impl CellConfigurator<Room> for RoomCell {
    fn configure(&self, room: &Room, view: &mut RowView, _: &Formatters) -> Vec<EnrichmentRequest> {
        view.title = format!("#{}", room.smart_name());
        Vec::new()
    }
}

/// Chat row for a text message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMessageCell;

impl CellConfigurator<Message> for TextMessageCell {
    fn configure(
        &self,
        message: &Message,
        view: &mut RowView,
        formatters: &Formatters,
    ) -> Vec<EnrichmentRequest> {
        view.title = message.sender.display_name().to_string();
        view.body.clone_from(&message.body);
        view.time = Some(formatters.short_time(message.timestamp_ms));
        view.tooltip = Some(formatters.detail_time(message.timestamp_ms));
        view.big_emoji = formatters.is_big_emoji(&message.body);

        vec![EnrichmentRequest::Avatar { user_id: message.sender.id.clone() }]
    }
}

/// Chat row for an image message: a text row plus a thumbnail.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageMessageCell;

impl CellConfigurator<Message> for ImageMessageCell {
    fn configure(
        &self,
        message: &Message,
        view: &mut RowView,
        formatters: &Formatters,
    ) -> Vec<EnrichmentRequest> {
        let mut requests = TextMessageCell.configure(message, view, formatters);
        view.big_emoji = false;
        if let Some(url) = message.image_url() {
            requests.push(EnrichmentRequest::Thumbnail { url: url.to_string() });
        }
        requests
    }
}

/// Strategies keyed by render kind.
pub struct CellRegistry<T> {
    strategies: HashMap<RenderKind, Arc<dyn CellConfigurator<T>>>,
}

impl<T> CellRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { strategies: HashMap::new() }
    }

    /// Register `strategy` for `kind`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, kind: RenderKind, strategy: impl CellConfigurator<T> + 'static) -> Self {
        self.strategies.insert(kind, Arc::new(strategy));
        self
    }

    /// Strategy for `kind`.
    pub fn get(&self, kind: RenderKind) -> Option<&dyn CellConfigurator<T>> {
        self.strategies.get(&kind).map(|strategy| &**strategy)
    }
}

impl CellRegistry<Room> {
    /// Sidebar strategies.
    pub fn rooms() -> Self {
        Self::new().with(RenderKind::Text, RoomCell)
    }
}

impl CellRegistry<Message> {
    /// Chat strategies.
    pub fn messages() -> Self {
        Self::new().with(RenderKind::Text, TextMessageCell).with(RenderKind::Image, ImageMessageCell)
    }
}

impl<T> Default for CellRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CellRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellRegistry").field("kinds", &self.strategies.keys()).finish()
    }
}
