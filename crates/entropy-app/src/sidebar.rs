//! Room list screen.

use std::sync::Arc;

use entropy_core::DiffConfig;
use entropy_store::{CollectionKey, ObservablePersistedList, Room, Store};

use crate::{
    BackendError, BindingError, CellRegistry, EnrichmentTicket, Formatters, ListBinding, Media,
    ViewList,
};

/// The sidebar: all rooms, one selected.
#[derive(Debug)]
pub struct SidebarScreen {
    rooms: ObservablePersistedList<Room>,
    binding: ListBinding<Room>,
    list: ViewList,
}

impl SidebarScreen {
    /// Sidebar over the rooms in `store`. Nothing is read until
    /// [`appear`](Self::appear).
    pub fn new<S: Store>(store: S, config: DiffConfig, formatters: Arc<Formatters>) -> Self {
        Self {
            rooms: ObservablePersistedList::rooms(store, config),
            binding: ListBinding::new("rooms", CellRegistry::rooms(), formatters),
            list: ViewList::new(),
        }
    }

    /// Show the sidebar: bind, load the rooms and select the first one.
    ///
    /// Returns the selected room, if there is one.
    pub fn appear(&mut self) -> Result<Option<Room>, BindingError> {
        self.binding.bind(self.rooms.collection());
        // A failed read leaves the list degraded; it is logged and retried on
        // the next change.
        let _ = self.rooms.refresh();
        self.binding.pump(&mut self.list)?;

        if self.binding.count() > 0 && self.binding.selected_item().is_none() {
            return self.select(0).map(Some);
        }
        Ok(self.binding.selected_item().cloned())
    }

    /// Stop observing the rooms.
    pub fn disappear(&mut self) {
        self.binding.unbind();
    }

    /// React to a store change. Returns whether the rooms were refreshed.
    pub fn handle_change(&mut self, key: CollectionKey) -> Result<bool, BindingError> {
        if !self.rooms.matches(key) {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    /// Re-read the rooms and apply what changed.
    pub fn refresh(&mut self) -> Result<(), BindingError> {
        let _ = self.rooms.refresh();
        self.binding.pump(&mut self.list)?;
        Ok(())
    }

    /// Select the room at `row`.
    pub fn select(&mut self, row: usize) -> Result<Room, BindingError> {
        let room = self.binding.select_row(row, &mut self.list)?.clone();
        tracing::debug!(room = %room.smart_name(), row, "room selected");
        Ok(room)
    }

    /// Move the selection by `delta` rows, clamped to the list.
    ///
    /// Returns the newly selected room, or `None` if the selection did not
    /// change.
    pub fn move_selection(&mut self, delta: isize) -> Result<Option<Room>, BindingError> {
        let count = self.binding.count();
        if count == 0 {
            return Ok(None);
        }
        let current = self.binding.selected_row();
        let target = match current {
            Some(row) => row.saturating_add_signed(delta).min(count - 1),
            None => 0,
        };
        if current == Some(target) {
            return Ok(None);
        }
        self.select(target).map(Some)
    }

    /// Configure rows that changed since the last draw.
    pub fn configure_dirty(&mut self) -> Result<Vec<EnrichmentTicket>, BindingError> {
        self.binding.configure_dirty(&mut self.list)
    }

    /// Hand a fetched avatar to the row it was issued for.
    pub fn complete_enrichment(
        &mut self,
        ticket: &EnrichmentTicket,
        result: Result<Media, BackendError>,
    ) -> bool {
        self.binding.complete_enrichment(ticket, result, &mut self.list)
    }

    /// Number of rooms shown.
    pub fn count(&self) -> usize {
        self.binding.count()
    }

    /// Selected room.
    pub fn selected(&self) -> Option<&Room> {
        self.binding.selected_item()
    }

    /// Whether the last read of the rooms failed.
    pub fn is_degraded(&self) -> bool {
        self.rooms.is_degraded()
    }

    /// Row views to draw.
    pub fn list(&self) -> &ViewList {
        &self.list
    }
}
