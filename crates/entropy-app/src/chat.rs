//! Message list screen for the open room.

use std::{path::PathBuf, sync::Arc};

use entropy_core::DiffConfig;
use entropy_store::{CollectionKey, Message, ObservablePersistedList, Room, RoomId, Store};

use crate::{
    BackendError, BindingError, CellRegistry, DropOperation, EnrichmentTicket, Formatters,
    ListBinding, ListSurface, Media, Upload, ViewList, file_drop,
};

/// The chat: messages of at most one open room.
#[derive(Debug)]
pub struct ChatScreen {
    room: Option<Room>,
    messages: Option<ObservablePersistedList<Message>>,
    binding: ListBinding<Message>,
    list: ViewList,
    config: DiffConfig,
}

impl ChatScreen {
    /// Empty chat with no room open.
    pub fn new(config: DiffConfig, formatters: Arc<Formatters>) -> Self {
        Self {
            room: None,
            messages: None,
            binding: ListBinding::new("messages", CellRegistry::messages(), formatters),
            list: ViewList::new(),
            config,
        }
    }

    /// Show the messages of `room`.
    ///
    /// The previous room's subscription is invalidated before the new room's
    /// list is observed, so nothing of the old room reaches this screen
    /// afterwards.
    pub fn open<S: Store>(&mut self, store: S, room: Room) -> Result<(), BindingError> {
        if self.room.as_ref().is_some_and(|open| open.id == room.id) {
            self.room = Some(room);
            return Ok(());
        }

        self.binding.unbind();
        tracing::debug!(room = %room.smart_name(), "opening room");

        let messages = ObservablePersistedList::messages(store, room.id, self.config);
        let _ = messages.refresh();
        self.binding.bind(messages.collection());
        self.messages = Some(messages);
        self.room = Some(room);

        self.binding.pump(&mut self.list)?;
        self.scroll_to_bottom();
        Ok(())
    }

    /// Close the open room and clear the list.
    pub fn close(&mut self) {
        self.binding.unbind();
        self.messages = None;
        self.room = None;
        self.list.reload_all(0);
    }

    /// React to a store change. Returns whether the messages were refreshed.
    pub fn handle_change(&mut self, key: CollectionKey) -> Result<bool, BindingError> {
        if !self.messages.as_ref().is_some_and(|messages| messages.matches(key)) {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    /// Re-read the open room's messages and apply what changed.
    pub fn refresh(&mut self) -> Result<(), BindingError> {
        let Some(messages) = &self.messages else {
            return Ok(());
        };
        let follow = self.is_at_bottom();
        let _ = messages.refresh();
        self.binding.pump(&mut self.list)?;
        if follow {
            self.scroll_to_bottom();
        }
        Ok(())
    }

    fn is_at_bottom(&self) -> bool {
        match self.binding.selected_row() {
            Some(row) => row + 1 >= self.binding.count(),
            None => true,
        }
    }

    fn scroll_to_bottom(&mut self) {
        if let Some(last) = self.binding.count().checked_sub(1) {
            let _ = self.binding.select_row(last, &mut self.list);
        }
    }

    /// Move the highlighted message by `delta` rows.
    pub fn scroll(&mut self, delta: isize) {
        let count = self.binding.count();
        if count == 0 {
            return;
        }
        let row = self.binding.selected_row().unwrap_or(count - 1);
        let target = row.saturating_add_signed(delta).min(count - 1);
        let _ = self.binding.select_row(target, &mut self.list);
    }

    /// Configure rows that changed since the last draw.
    pub fn configure_dirty(&mut self) -> Result<Vec<EnrichmentTicket>, BindingError> {
        self.binding.configure_dirty(&mut self.list)
    }

    /// Hand a fetched avatar or thumbnail to the row it was issued for.
    pub fn complete_enrichment(
        &mut self,
        ticket: &EnrichmentTicket,
        result: Result<Media, BackendError>,
    ) -> bool {
        self.binding.complete_enrichment(ticket, result, &mut self.list)
    }

    /// Operation offered for files dragged over the chat.
    pub fn drag_entered(&self, paths: &[PathBuf]) -> DropOperation {
        file_drop::drag_operation(self.room_id(), paths)
    }

    /// Uploads for files dropped on the chat.
    pub fn perform_drop(&self, paths: Vec<PathBuf>) -> Vec<Upload> {
        file_drop::perform_drop(self.room_id(), paths)
    }

    /// Open room.
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    /// ID of the open room.
    pub fn room_id(&self) -> Option<RoomId> {
        self.room.as_ref().map(|room| room.id)
    }

    /// Whether the last read of the open room failed.
    pub fn is_degraded(&self) -> bool {
        self.messages.as_ref().is_some_and(ObservablePersistedList::is_degraded)
    }

    /// Binding of the message list.
    pub fn binding(&self) -> &ListBinding<Message> {
        &self.binding
    }

    /// Row views to draw.
    pub fn list(&self) -> &ViewList {
        &self.list
    }
}
