//! Storage abstraction for rooms, messages and the session
//!
//! Trait-based abstraction over the client's local database. The trait is
//! synchronous (no async) so it can be called from background tasks and from
//! the UI loop alike; implementations share internal state via `Arc`, so
//! clones access the same underlying storage.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStore;
pub use error::StoreError;
pub use memory::MemoryStore;

pub use self::redb::RedbStore;
use crate::{Message, Room, RoomId, Session};

/// Local storage for the client's persisted state.
///
/// Must be Clone (shared between the UI loop and background writers),
/// Send + Sync (thread-safe), and synchronous.
pub trait Store: Clone + Send + Sync + 'static {
    /// Insert or replace a room.
    fn store_room(&self, room: &Room) -> Result<(), StoreError>;

    /// Load a single room. `None` if it was never stored.
    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StoreError>;

    /// Remove a room together with all of its messages.
    ///
    /// Removing an unknown room is a no-op.
    fn remove_room(&self, room_id: RoomId) -> Result<(), StoreError>;

    /// All rooms in sidebar order (most recent activity first).
    fn list_rooms(&self) -> Result<Vec<Room>, StoreError>;

    /// Insert or replace a message, keyed by its event ID.
    ///
    /// # Invariants
    ///
    /// - Pre: the message's room has been stored
    /// - Post: `load_messages` returns the message exactly once
    fn store_message(&self, message: &Message) -> Result<(), StoreError>;

    /// Remove a message. Unknown event IDs are ignored.
    fn remove_message(&self, room_id: RoomId, event_id: &str) -> Result<(), StoreError>;

    /// All messages of a room in timeline order (oldest first).
    ///
    /// Returns [`StoreError::NotFound`] if the room was never stored.
    fn load_messages(&self, room_id: RoomId) -> Result<Vec<Message>, StoreError>;

    /// Persist the logged-in session, replacing any previous one.
    fn store_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Stored session, if logged in.
    fn load_session(&self) -> Result<Option<Session>, StoreError>;

    /// Forget the stored session.
    fn clear_session(&self) -> Result<(), StoreError>;
}
