//! Scoped observer registrations.
//!
//! A [`Subscription`] owns a mailbox of pending [`ChangeSet`]s. The collection
//! only keeps a `Weak` reference to that mailbox, so a subscription that is
//! never explicitly invalidated still goes away with its owner, and a
//! collection that is dropped does not take a live subscriber down with it.
//!
//! # Invariants
//!
//! - Deliveries are FIFO. The one exception is `Reload`, which discards
//!   whatever was still queued for this subscription.
//! - Liveness is checked at delivery time: once invalidated, nothing queued
//!   before the invalidation is handed out.
//! - `invalidate()` is idempotent; dropping a subscription invalidates it.

use std::{
    collections::VecDeque,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{ChangeSet, Item, collection::Shared};

/// Identifier of one subscription, unique per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Delivery queue shared between a subscription and its collection.
pub(crate) struct Mailbox<T> {
    id: SubscriptionId,
    active: AtomicBool,
    queue: Mutex<VecDeque<ChangeSet<T>>>,
}

impl<T> Mailbox<T> {
    pub(crate) fn new(id: SubscriptionId) -> Self {
        Self { id, active: AtomicBool::new(true), queue: Mutex::new(VecDeque::new()) }
    }

    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Enqueue a change. A reload subsumes anything still pending.
    pub(crate) fn push(&self, change: ChangeSet<T>) {
        let mut queue = self.queue();
        if !self.is_active() {
            return;
        }
        if change.is_reload() && !queue.is_empty() {
            tracing::trace!(subscription = %self.id, dropped = queue.len(), "reload subsumes pending");
            queue.clear();
        }
        queue.push_back(change);
    }

    fn pop(&self) -> Option<ChangeSet<T>> {
        let mut queue = self.queue();
        if !self.is_active() {
            return None;
        }
        queue.pop_front()
    }

    fn pending(&self) -> usize {
        self.queue().len()
    }

    fn close(&self) {
        self.active.store(false, Ordering::Release);
        self.queue().clear();
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<ChangeSet<T>>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A live registration on an [`crate::ObservableCollection`].
///
/// Created by [`crate::ObservableCollection::add_observer`], which queues an
/// initial `Reload` so a new consumer never special-cases its first load.
/// The owner pulls changes with [`Subscription::next_change`] on its UI loop.
pub struct Subscription<T: Item> {
    mailbox: Arc<Mailbox<T>>,
    collection: Option<Weak<Shared<T>>>,
}

impl<T: Item> Subscription<T> {
    pub(crate) fn new(mailbox: Arc<Mailbox<T>>, collection: Weak<Shared<T>>) -> Self {
        Self { mailbox, collection: Some(collection) }
    }

    /// Identifier of this subscription.
    pub fn id(&self) -> SubscriptionId {
        self.mailbox.id()
    }

    /// Whether changes are still delivered to this subscription.
    pub fn is_active(&self) -> bool {
        self.mailbox.is_active()
    }

    /// Oldest pending change, if still active.
    pub fn next_change(&self) -> Option<ChangeSet<T>> {
        self.mailbox.pop()
    }

    /// All pending changes in delivery order.
    pub fn drain(&self) -> Vec<ChangeSet<T>> {
        std::iter::from_fn(|| self.next_change()).collect()
    }

    /// Number of changes waiting for delivery.
    pub fn pending(&self) -> usize {
        if self.is_active() { self.mailbox.pending() } else { 0 }
    }

    /// Stop all further deliveries and release the collection reference.
    ///
    /// Calling this on an already invalidated subscription does nothing.
    pub fn invalidate(&mut self) {
        let Some(collection) = self.collection.take() else {
            return;
        };

        self.mailbox.close();
        if let Some(shared) = collection.upgrade() {
            shared.detach(self.id());
        }
        tracing::debug!(subscription = %self.id(), "subscription invalidated");
    }
}

impl<T: Item> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.invalidate();
    }
}

impl<T: Item> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .field("pending", &self.pending())
            .finish()
    }
}
