//! Redb-backed durable store.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. Values
//! are CBOR-encoded records; keys are laid out so that a range scan returns
//! rows in display order without sorting.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};

use super::{Store, StoreError};
use crate::{Message, Room, RoomId, Session, sort_rooms};

/// Table: rooms
/// Key: room_id as big-endian bytes [16 bytes]
/// Value: CBOR-encoded Room
const ROOMS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("rooms");

/// Table: messages
/// Key: room_id BE [16] + order-preserving timestamp [8] + event_id bytes
/// Value: CBOR-encoded Message
const MESSAGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("messages");

/// Table: message_index
/// Key: room_id BE [16] + event_id bytes
/// Value: MESSAGES key of the current version of that event
const MESSAGE_INDEX: TableDefinition<&[u8], &[u8]> = TableDefinition::new("message_index");

/// Table: session
/// Key: fixed `SESSION_KEY`
/// Value: CBOR-encoded Session
const SESSION: TableDefinition<&[u8], &[u8]> = TableDefinition::new("session");

const SESSION_KEY: &[u8] = b"current";

const ROOM_KEY_LEN: usize = 16;

/// Durable store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        let txn = db.begin_write().map_err(io_err)?;
        {
            let _ = txn.open_table(ROOMS).map_err(io_err)?;
            let _ = txn.open_table(MESSAGES).map_err(io_err)?;
            let _ = txn.open_table(MESSAGE_INDEX).map_err(io_err)?;
            let _ = txn.open_table(SESSION).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;

        tracing::debug!(path = %path.as_ref().display(), "opened redb store");
        Ok(Self { db: Arc::new(db) })
    }

    fn room_exists(&self, room_id: RoomId) -> Result<bool, StoreError> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(ROOMS).map_err(io_err)?;
        let key = encode_room_key(room_id);
        Ok(table.get(key.as_slice()).map_err(io_err)?.is_some())
    }
}

impl Store for RedbStore {
    fn store_room(&self, room: &Room) -> Result<(), StoreError> {
        let bytes = encode(room)?;
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(ROOMS).map_err(io_err)?;
            let key = encode_room_key(room.id);
            table.insert(key.as_slice(), bytes.as_slice()).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StoreError> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(ROOMS).map_err(io_err)?;
        let key = encode_room_key(room_id);

        match table.get(key.as_slice()).map_err(io_err)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn remove_room(&self, room_id: RoomId) -> Result<(), StoreError> {
        let prefix = encode_room_key(room_id);
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut rooms = txn.open_table(ROOMS).map_err(io_err)?;
            rooms.remove(prefix.as_slice()).map_err(io_err)?;

            let mut messages = txn.open_table(MESSAGES).map_err(io_err)?;
            let message_keys = keys_with_prefix(&messages, &prefix)?;
            for key in message_keys {
                messages.remove(key.as_slice()).map_err(io_err)?;
            }

            let mut index = txn.open_table(MESSAGE_INDEX).map_err(io_err)?;
            let index_keys = keys_with_prefix(&index, &prefix)?;
            for key in index_keys {
                index.remove(key.as_slice()).map_err(io_err)?;
            }
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(ROOMS).map_err(io_err)?;

        let mut rooms = Vec::new();
        for result in table.iter().map_err(io_err)? {
            let (_, value) = result.map_err(io_err)?;
            rooms.push(decode::<Room>(value.value())?);
        }

        sort_rooms(&mut rooms);
        Ok(rooms)
    }

    fn store_message(&self, message: &Message) -> Result<(), StoreError> {
        if !self.room_exists(message.room_id)? {
            return Err(StoreError::NotFound { room_id: message.room_id });
        }

        let bytes = encode(message)?;
        let index_key = encode_index_key(message.room_id, &message.event_id);
        let message_key = encode_message_key(message);

        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut index = txn.open_table(MESSAGE_INDEX).map_err(io_err)?;
            let mut messages = txn.open_table(MESSAGES).map_err(io_err)?;

            let previous =
                index.get(index_key.as_slice()).map_err(io_err)?.map(|v| v.value().to_vec());
            if let Some(previous) = previous {
                messages.remove(previous.as_slice()).map_err(io_err)?;
            }

            messages.insert(message_key.as_slice(), bytes.as_slice()).map_err(io_err)?;
            index.insert(index_key.as_slice(), message_key.as_slice()).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn remove_message(&self, room_id: RoomId, event_id: &str) -> Result<(), StoreError> {
        let index_key = encode_index_key(room_id, event_id);

        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut index = txn.open_table(MESSAGE_INDEX).map_err(io_err)?;
            let mut messages = txn.open_table(MESSAGES).map_err(io_err)?;

            let previous =
                index.remove(index_key.as_slice()).map_err(io_err)?.map(|v| v.value().to_vec());
            if let Some(previous) = previous {
                messages.remove(previous.as_slice()).map_err(io_err)?;
            }
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn load_messages(&self, room_id: RoomId) -> Result<Vec<Message>, StoreError> {
        if !self.room_exists(room_id)? {
            return Err(StoreError::NotFound { room_id });
        }

        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(MESSAGES).map_err(io_err)?;
        let prefix = encode_room_key(room_id);

        let mut messages = Vec::new();
        for result in table.range(prefix.as_slice()..).map_err(io_err)? {
            let (key, value) = result.map_err(io_err)?;
            if !key.value().starts_with(&prefix) {
                break;
            }
            messages.push(decode::<Message>(value.value())?);
        }

        Ok(messages)
    }

    fn store_session(&self, session: &Session) -> Result<(), StoreError> {
        let bytes = encode(session)?;
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(SESSION).map_err(io_err)?;
            table.insert(SESSION_KEY, bytes.as_slice()).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn load_session(&self) -> Result<Option<Session>, StoreError> {
        let txn = self.db.begin_read().map_err(io_err)?;
        let table = txn.open_table(SESSION).map_err(io_err)?;

        match table.get(SESSION_KEY).map_err(io_err)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn clear_session(&self) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = txn.open_table(SESSION).map_err(io_err)?;
            table.remove(SESSION_KEY).map_err(io_err)?;
        }
        txn.commit().map_err(io_err)?;
        Ok(())
    }
}

fn io_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Io(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Collect all keys starting with `prefix` (keys are copied so the table can
/// be mutated afterwards).
fn keys_with_prefix<T: ReadableTable<&'static [u8], &'static [u8]>>(
    table: &T,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>, StoreError> {
    let mut keys = Vec::new();
    for result in table.range(prefix..).map_err(io_err)? {
        let (key, _) = result.map_err(io_err)?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        keys.push(key.to_vec());
    }
    Ok(keys)
}

/// Encode room key: room_id as 16 bytes big-endian.
fn encode_room_key(room_id: RoomId) -> [u8; ROOM_KEY_LEN] {
    room_id.to_be_bytes()
}

/// Encode message key so byte order equals timeline order within a room.
///
/// The sign bit of the timestamp is flipped so negative timestamps sort
/// before positive ones.
fn encode_message_key(message: &Message) -> Vec<u8> {
    let mut key = Vec::with_capacity(ROOM_KEY_LEN + 8 + message.event_id.len());
    key.extend_from_slice(&encode_room_key(message.room_id));
    key.extend_from_slice(&((message.timestamp_ms as u64) ^ (1 << 63)).to_be_bytes());
    key.extend_from_slice(message.event_id.as_bytes());
    key
}

/// Encode index key: room_id (16 bytes) + event_id bytes.
fn encode_index_key(room_id: RoomId, event_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(ROOM_KEY_LEN + event_id.len());
    key.extend_from_slice(&encode_room_key(room_id));
    key.extend_from_slice(event_id.as_bytes());
    key
}
