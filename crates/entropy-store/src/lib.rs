//! Persisted state for Entropy
//!
//! Domain records (rooms, messages, the session), the [`Store`] abstraction
//! with in-memory, Redb and fault-injecting implementations, and the glue that
//! keeps observable lists in step with the store.
//!
//! # Components
//!
//! - [`Store`]: synchronous storage trait shared by writers and the UI loop
//! - [`ChangeFeed`]: store wrapper publishing a [`CollectionKey`] per write
//! - [`ObservablePersistedList`]: collection refreshed from the store, degraded
//!   to an empty reload when a read fails

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod feed;
mod model;
mod persisted;
pub mod storage;

pub use feed::{ChangeFeed, CollectionKey, DEFAULT_FEED_CAPACITY};
pub use model::{
    EventId, Message, MessageContent, Room, RoomId, Session, User, UserId, sort_messages,
    sort_rooms,
};
pub use persisted::{ObservablePersistedList, RefreshError};
pub use storage::{ChaoticStore, MemoryStore, RedbStore, Store, StoreError};
