use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::{Store, StoreError};
use crate::{EventId, Message, Room, RoomId, Session, sort_messages, sort_rooms};

/// In-memory store for testing and simulation
///
/// Uses `HashMap`s keyed by room and event ID; ordering is applied on read.
/// All state is wrapped in `Arc<Mutex<>>` to allow Clone and concurrent
/// access. A poisoned lock is recovered rather than propagated, since every
/// write leaves the maps in a consistent state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Rooms by ID
    rooms: HashMap<RoomId, Room>,

    /// Messages by room, then event ID
    messages: HashMap<RoomId, HashMap<EventId, Message>>,

    /// Logged-in session
    session: Option<Session>,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of messages across all rooms.
    ///
    /// Useful for debugging and testing.
    pub fn total_message_count(&self) -> usize {
        self.lock().messages.values().map(HashMap::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn store_room(&self, room: &Room) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.rooms.insert(room.id, room.clone());
        inner.messages.entry(room.id).or_default();
        Ok(())
    }

    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StoreError> {
        Ok(self.lock().rooms.get(&room_id).cloned())
    }

    fn remove_room(&self, room_id: RoomId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.rooms.remove(&room_id);
        inner.messages.remove(&room_id);
        Ok(())
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let mut rooms: Vec<Room> = self.lock().rooms.values().cloned().collect();
        sort_rooms(&mut rooms);
        Ok(rooms)
    }

    fn store_message(&self, message: &Message) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let messages = inner
            .messages
            .get_mut(&message.room_id)
            .ok_or(StoreError::NotFound { room_id: message.room_id })?;

        messages.insert(message.event_id.clone(), message.clone());
        Ok(())
    }

    fn remove_message(&self, room_id: RoomId, event_id: &str) -> Result<(), StoreError> {
        if let Some(messages) = self.lock().messages.get_mut(&room_id) {
            messages.remove(event_id);
        }
        Ok(())
    }

    fn load_messages(&self, room_id: RoomId) -> Result<Vec<Message>, StoreError> {
        let inner = self.lock();
        let messages = inner.messages.get(&room_id).ok_or(StoreError::NotFound { room_id })?;

        let mut ordered: Vec<Message> = messages.values().cloned().collect();
        sort_messages(&mut ordered);
        Ok(ordered)
    }

    fn store_session(&self, session: &Session) -> Result<(), StoreError> {
        self.lock().session = Some(session.clone());
        Ok(())
    }

    fn load_session(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.lock().session.clone())
    }

    fn clear_session(&self) -> Result<(), StoreError> {
        self.lock().session = None;
        Ok(())
    }
}
