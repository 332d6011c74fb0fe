//! Store-backed observable lists.

use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use entropy_core::{
    CollectionError, DiffConfig, Item, Mutation, ObservableCollection, Subscription,
};
use thiserror::Error;

use crate::{CollectionKey, Message, Room, RoomId, Store, StoreError};

/// Errors from refreshing a persisted list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// Reading the store failed; the list is now degraded.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The store returned contents the collection rejected; the list is now
    /// degraded.
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

type Loader<T> = Box<dyn Fn() -> Result<Vec<T>, StoreError> + Send + Sync>;

/// An [`ObservableCollection`] whose contents are read from a [`Store`].
///
/// `refresh` re-reads the full contents and lets the collection diff them
/// against what observers last saw. A failed read degrades the list: it
/// reloads observers with nothing and reports [`is_degraded`] until a later
/// refresh succeeds. An empty degraded list means "unknown", not "empty".
///
/// [`is_degraded`]: ObservablePersistedList::is_degraded
pub struct ObservablePersistedList<T: Item> {
    key: CollectionKey,
    collection: ObservableCollection<T>,
    loader: Loader<T>,
    degraded: AtomicBool,
}

impl ObservablePersistedList<Room> {
    /// The room list, in sidebar order.
    pub fn rooms<S: Store>(store: S, config: DiffConfig) -> Self {
        Self::new(CollectionKey::Rooms, config, move || store.list_rooms())
    }
}

impl ObservablePersistedList<Message> {
    /// The timeline of `room_id`, oldest first.
    pub fn messages<S: Store>(store: S, room_id: RoomId, config: DiffConfig) -> Self {
        Self::new(CollectionKey::Messages(room_id), config, move || store.load_messages(room_id))
    }
}

impl<T: Item> ObservablePersistedList<T> {
    /// Create an empty list that reads its contents with `loader`.
    ///
    /// Nothing is read until the first [`refresh`](Self::refresh).
    pub fn new<F>(key: CollectionKey, config: DiffConfig, loader: F) -> Self
    where
        F: Fn() -> Result<Vec<T>, StoreError> + Send + Sync + 'static,
    {
        Self {
            key,
            collection: ObservableCollection::with_limits(config),
            loader: Box::new(loader),
            degraded: AtomicBool::new(false),
        }
    }

    /// Key this list is refreshed for.
    pub fn key(&self) -> CollectionKey {
        self.key
    }

    /// Whether a published change concerns this list.
    pub fn matches(&self, key: CollectionKey) -> bool {
        self.key == key
    }

    /// Re-read the contents and broadcast what changed.
    ///
    /// Returns the number of change sets broadcast.
    ///
    /// # Errors
    ///
    /// Returns the read or collection error. The list has already been
    /// degraded when this returns an error.
    pub fn refresh(&self) -> Result<usize, RefreshError> {
        let result = (self.loader)()
            .map_err(RefreshError::from)
            .and_then(|items| self.collection.apply(Mutation::Replace(items)).map_err(Into::into));

        match result {
            Ok(changes) => {
                if self.degraded.swap(false, Ordering::AcqRel) {
                    tracing::info!(key = ?self.key, "list recovered");
                }
                tracing::debug!(key = ?self.key, changes, count = self.collection.count(), "list refreshed");
                Ok(changes)
            },
            Err(error) => {
                tracing::warn!(key = ?self.key, %error, "list refresh failed, showing nothing");
                self.degraded.store(true, Ordering::Release);
                self.collection.degrade();
                Err(error)
            },
        }
    }

    /// Whether the last refresh failed.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Register an observer of the underlying collection.
    pub fn add_observer(&self) -> Subscription<T> {
        self.collection.add_observer()
    }

    /// The underlying collection.
    pub fn collection(&self) -> &ObservableCollection<T> {
        &self.collection
    }

    /// Number of items shown.
    pub fn count(&self) -> usize {
        self.collection.count()
    }

    /// Item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::OutOfRange`] if `index >= count()`.
    pub fn item(&self, index: usize) -> Result<T, CollectionError> {
        self.collection.item(index)
    }
}

impl<T: Item> fmt::Debug for ObservablePersistedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservablePersistedList")
            .field("key", &self.key)
            .field("count", &self.count())
            .field("degraded", &self.is_degraded())
            .finish_non_exhaustive()
    }
}
