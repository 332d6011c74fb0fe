//! The observable, ordered collection.
//!
//! [`ObservableCollection`] owns the canonical item order. Every mutation is
//! turned into the next full order, diffed by identity against the previous
//! one and broadcast to all live subscriptions as [`ChangeSet`]s.
//!
//! The collection is cheap to clone (shared `Arc`) and may be mutated from any
//! thread. Delivery to consumers is pull-based: each subscription queues its
//! own changes and the owning UI loop drains them, so diffing never calls into
//! UI code while the collection lock is held.

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    ChangeSet, CollectionError, DiffConfig, Item,
    changeset::diff,
    subscription::{Mailbox, Subscription, SubscriptionId},
};

/// A change to the collection's contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T: Item> {
    /// Replace the whole contents with a freshly read order.
    Replace(Vec<T>),
    /// Append a new item. Fails if its identity is already present.
    Append(T),
    /// Replace the item with the same identity in place, or append it.
    Upsert(T),
    /// Remove the item with this identity. Missing identities are ignored.
    Remove(T::Id),
}

pub(crate) struct Shared<T: Item> {
    state: Mutex<State<T>>,
    config: DiffConfig,
    next_id: AtomicU64,
}

struct State<T: Item> {
    items: Vec<T>,
    observers: Vec<Weak<Mailbox<T>>>,
}

impl<T: Item> Shared<T> {
    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget a subscription's mailbox (and any dead ones on the way).
    pub(crate) fn detach(&self, id: SubscriptionId) {
        self.state()
            .observers
            .retain(|weak| weak.upgrade().is_some_and(|mailbox| mailbox.id() != id));
    }
}

impl<T: Item> State<T> {
    fn broadcast(&mut self, change: &ChangeSet<T>) {
        self.observers.retain(|weak| {
            let Some(mailbox) = weak.upgrade() else {
                return false;
            };
            if !mailbox.is_active() {
                return false;
            }
            tracing::trace!(subscription = %mailbox.id(), kind = change.kind(), rows = change.len(), "enqueue change");
            mailbox.push(change.clone());
            true
        });
    }
}

/// Persisted-order collection that broadcasts granular changes.
pub struct ObservableCollection<T: Item> {
    shared: Arc<Shared<T>>,
}

impl<T: Item> Clone for ObservableCollection<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T: Item> Default for ObservableCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Item> ObservableCollection<T> {
    /// Create an empty collection with default diff limits.
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), DiffConfig::default())
    }

    /// Create an empty collection with explicit diff limits.
    pub fn with_limits(config: DiffConfig) -> Self {
        Self::from_parts(Vec::new(), config)
    }

    /// Create a collection holding `items` in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DuplicateIdentity`] if two items share an
    /// identity.
    pub fn with_items(items: Vec<T>) -> Result<Self, CollectionError> {
        Self::with_config(items, DiffConfig::default())
    }

    /// Create a collection with explicit diff limits.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DuplicateIdentity`] if two items share an
    /// identity.
    pub fn with_config(items: Vec<T>, config: DiffConfig) -> Result<Self, CollectionError> {
        ensure_unique(&items)?;
        Ok(Self::from_parts(items, config))
    }

    fn from_parts(items: Vec<T>, config: DiffConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State { items, observers: Vec::new() }),
                config,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Number of items currently in the collection.
    pub fn count(&self) -> usize {
        self.shared.state().items.len()
    }

    /// Whether the collection holds no items.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::OutOfRange`] if `index >= count()`.
    pub fn item(&self, index: usize) -> Result<T, CollectionError> {
        let state = self.shared.state();
        state
            .items
            .get(index)
            .cloned()
            .ok_or(CollectionError::OutOfRange { index, count: state.items.len() })
    }

    /// Position of the item with identity `id`, if present.
    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.shared.state().items.iter().position(|item| &item.id() == id)
    }

    /// Copy of the current contents in order.
    pub fn snapshot(&self) -> Vec<T> {
        self.shared.state().items.clone()
    }

    /// Diff limits used by this collection.
    pub fn config(&self) -> DiffConfig {
        self.shared.config
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        let mut state = self.shared.state();
        state.observers.retain(|weak| weak.upgrade().is_some_and(|mailbox| mailbox.is_active()));
        state.observers.len()
    }

    /// Register a new observer.
    ///
    /// The returned subscription already holds a `Reload` with the current
    /// contents.
    pub fn add_observer(&self) -> Subscription<T> {
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let mailbox = Arc::new(Mailbox::new(id));

        let mut state = self.shared.state();
        mailbox.push(ChangeSet::Reload { items: state.items.clone() });
        state.observers.push(Arc::downgrade(&mailbox));
        drop(state);

        tracing::debug!(subscription = %id, "observer added");
        Subscription::new(mailbox, Arc::downgrade(&self.shared))
    }

    /// Apply a mutation and broadcast the resulting changes.
    ///
    /// Returns the number of change sets broadcast (zero if nothing visible
    /// changed).
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DuplicateIdentity`] if the mutation would
    /// break identity uniqueness. The collection is left untouched.
    pub fn apply(&self, mutation: Mutation<T>) -> Result<usize, CollectionError> {
        let mut state = self.shared.state();
        let next = next_order(&state.items, mutation)?;

        let changes = diff(&state.items, &next, &self.shared.config);
        state.items = next;
        for change in &changes {
            state.broadcast(change);
        }

        Ok(changes.len())
    }

    /// Drop all contents and tell every observer to reload an empty list.
    ///
    /// Used when the backing read failed; an empty collection after this is
    /// "unknown", not "known to be empty".
    pub fn degrade(&self) {
        let mut state = self.shared.state();
        state.items.clear();
        state.broadcast(&ChangeSet::Reload { items: Vec::new() });
        tracing::debug!("collection degraded to empty reload");
    }
}

/// Compute the full order a mutation leads to.
fn next_order<T: Item>(current: &[T], mutation: Mutation<T>) -> Result<Vec<T>, CollectionError> {
    match mutation {
        Mutation::Replace(items) => {
            ensure_unique(&items)?;
            Ok(items)
        },
        Mutation::Append(item) => {
            let id = item.id();
            if current.iter().any(|existing| existing.id() == id) {
                return Err(CollectionError::DuplicateIdentity(format!("{id:?}")));
            }
            let mut next = current.to_vec();
            next.push(item);
            Ok(next)
        },
        Mutation::Upsert(item) => {
            let id = item.id();
            let mut next = current.to_vec();
            match next.iter_mut().find(|existing| existing.id() == id) {
                Some(existing) => *existing = item,
                None => next.push(item),
            }
            Ok(next)
        },
        Mutation::Remove(id) => Ok(current.iter().filter(|item| item.id() != id).cloned().collect()),
    }
}

fn ensure_unique<T: Item>(items: &[T]) -> Result<(), CollectionError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        let id = item.id();
        if !seen.insert(id.clone()) {
            return Err(CollectionError::DuplicateIdentity(format!("{id:?}")));
        }
    }
    Ok(())
}
