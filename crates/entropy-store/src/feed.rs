//! Change notifications for persisted collections.
//!
//! Writers may run on any thread or task. They never touch a collection
//! directly: after a successful write the feed publishes the key of every
//! collection whose contents may have changed, and the UI loop refreshes
//! the matching lists.

use tokio::sync::broadcast;

use crate::{Message, Room, RoomId, Session, Store, StoreError};

/// Default capacity of the notification channel.
///
/// A receiver that falls further behind than this gets `Lagged` and must
/// refresh everything it shows.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Identity of a persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    /// The room list.
    Rooms,
    /// The timeline of one room.
    Messages(RoomId),
}

/// Store wrapper that publishes a [`CollectionKey`] after every write.
///
/// Reads go straight to the inner store. Clones share the store and the
/// channel.
#[derive(Clone)]
pub struct ChangeFeed<S: Store> {
    store: S,
    sender: broadcast::Sender<CollectionKey>,
}

impl<S: Store> ChangeFeed<S> {
    /// Wrap `store` with the default channel capacity.
    pub fn new(store: S) -> Self {
        Self::with_capacity(store, DEFAULT_FEED_CAPACITY)
    }

    /// Wrap `store` with an explicit channel capacity.
    pub fn with_capacity(store: S, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { store, sender }
    }

    /// Receive keys published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionKey> {
        self.sender.subscribe()
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn publish(&self, key: CollectionKey) {
        // No receivers is fine: nothing is on screen yet.
        if self.sender.send(key).is_err() {
            tracing::trace!(?key, "change published with no receivers");
        }
    }

    /// Insert or replace a room and publish [`CollectionKey::Rooms`].
    pub fn store_room(&self, room: &Room) -> Result<(), StoreError> {
        self.store.store_room(room)?;
        self.publish(CollectionKey::Rooms);
        Ok(())
    }

    /// Remove a room and publish both the room list and its timeline.
    pub fn remove_room(&self, room_id: RoomId) -> Result<(), StoreError> {
        self.store.remove_room(room_id)?;
        self.publish(CollectionKey::Rooms);
        self.publish(CollectionKey::Messages(room_id));
        Ok(())
    }

    /// Insert or replace a message and publish its room's timeline.
    ///
    /// The room's last activity is bumped when the message is newer, which
    /// also republishes the room list.
    pub fn store_message(&self, message: &Message) -> Result<(), StoreError> {
        self.store.store_message(message)?;
        self.publish(CollectionKey::Messages(message.room_id));

        if let Some(mut room) = self.store.load_room(message.room_id)?
            && room.last_activity_ms < message.timestamp_ms
        {
            room.last_activity_ms = message.timestamp_ms;
            self.store_room(&room)?;
        }
        Ok(())
    }

    /// Remove a message and publish its room's timeline.
    pub fn remove_message(&self, room_id: RoomId, event_id: &str) -> Result<(), StoreError> {
        self.store.remove_message(room_id, event_id)?;
        self.publish(CollectionKey::Messages(room_id));
        Ok(())
    }

    /// Persist the session. Sessions are not observed, so nothing is
    /// published.
    pub fn store_session(&self, session: &Session) -> Result<(), StoreError> {
        self.store.store_session(session)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::{MemoryStore, User};

    fn drain(receiver: &mut broadcast::Receiver<CollectionKey>) -> Vec<CollectionKey> {
        let mut keys = Vec::new();
        while let Ok(key) = receiver.try_recv() {
            keys.push(key);
        }
        keys
    }

    #[test]
    fn room_write_publishes_rooms() {
        let feed = ChangeFeed::new(MemoryStore::new());
        let mut receiver = feed.subscribe();

        feed.store_room(&Room::new(1, 0)).expect("store");

        assert_eq!(drain(&mut receiver), vec![CollectionKey::Rooms]);
    }

    #[test]
    fn newer_message_bumps_room_activity() {
        let feed = ChangeFeed::new(MemoryStore::new());
        feed.store_room(&Room::new(1, 10)).expect("store");
        let mut receiver = feed.subscribe();

        let sender = User::new("@a:x", "Alice");
        feed.store_message(&Message::text("$a", 1, sender.clone(), "hi", 20)).expect("store");
        assert_eq!(drain(&mut receiver), vec![
            CollectionKey::Messages(1),
            CollectionKey::Rooms
        ]);
        assert_eq!(feed.store().load_room(1).expect("load").map(|r| r.last_activity_ms), Some(20));

        feed.store_message(&Message::text("$b", 1, sender, "old", 5)).expect("store");
        assert_eq!(drain(&mut receiver), vec![CollectionKey::Messages(1)]);
    }

    #[test]
    fn failed_write_publishes_nothing() {
        let feed = ChangeFeed::new(MemoryStore::new());
        let mut receiver = feed.subscribe();

        let orphan = Message::text("$a", 9, User::new("@a:x", "Alice"), "hi", 0);
        assert!(feed.store_message(&orphan).is_err());

        assert_eq!(receiver.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn writes_without_receivers_succeed() {
        let feed = ChangeFeed::new(MemoryStore::new());
        feed.store_room(&Room::new(1, 0)).expect("store without receivers");
    }

    #[test]
    fn slow_receiver_lags() {
        let feed = ChangeFeed::with_capacity(MemoryStore::new(), 2);
        let mut receiver = feed.subscribe();

        for id in 0..5 {
            feed.store_room(&Room::new(id, 0)).expect("store");
        }

        assert!(matches!(receiver.try_recv(), Err(TryRecvError::Lagged(_))));
    }
}
