//! Fault-injecting store wrapper
//!
//! Randomly fails reads and writes so list refresh and error paths can be
//! exercised without a broken disk.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use super::{Store, StoreError};
use crate::{Message, Room, RoomId, Session};

const DEFAULT_SEED: u64 = 0x1234_5678_9ABC_DEF0;

/// Store wrapper that randomly injects [`StoreError::Io`] failures.
///
/// Delegates to an inner store. The RNG is a seeded LCG shared between clones,
/// so a given seed and call sequence always fails at the same points.
#[derive(Clone)]
pub struct ChaoticStore<S: Store> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    rng: Arc<Mutex<Lcg>>,
    operation_count: Arc<AtomicUsize>,
}

/// Linear congruential generator (Numerical Recipes constants).
struct Lcg {
    state: u64,
}

impl Lcg {
    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = A.wrapping_mul(self.state).wrapping_add(C) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: Store> ChaoticStore<S> {
    /// Wrap `inner`, failing each operation with probability `failure_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, DEFAULT_SEED)
    }

    /// Create with explicit seed for reproducible failures.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(Lcg { state: seed })),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Underlying store, for checking state after failures.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of operations attempted, failed or not.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    fn roll(&self) -> Result<(), StoreError> {
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        let failed =
            self.rng.lock().unwrap_or_else(PoisonError::into_inner).next() < self.failure_rate;

        if failed {
            tracing::trace!("injecting store failure");
            Err(StoreError::Io("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl<S: Store> Store for ChaoticStore<S> {
    fn store_room(&self, room: &Room) -> Result<(), StoreError> {
        self.roll()?;
        self.inner.store_room(room)
    }

    fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, StoreError> {
        self.roll()?;
        self.inner.load_room(room_id)
    }

    fn remove_room(&self, room_id: RoomId) -> Result<(), StoreError> {
        self.roll()?;
        self.inner.remove_room(room_id)
    }

    fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        self.roll()?;
        self.inner.list_rooms()
    }

    fn store_message(&self, message: &Message) -> Result<(), StoreError> {
        self.roll()?;
        self.inner.store_message(message)
    }

    fn remove_message(&self, room_id: RoomId, event_id: &str) -> Result<(), StoreError> {
        self.roll()?;
        self.inner.remove_message(room_id, event_id)
    }

    fn load_messages(&self, room_id: RoomId) -> Result<Vec<Message>, StoreError> {
        self.roll()?;
        self.inner.load_messages(room_id)
    }

    fn store_session(&self, session: &Session) -> Result<(), StoreError> {
        self.roll()?;
        self.inner.store_session(session)
    }

    fn load_session(&self) -> Result<Option<Session>, StoreError> {
        self.roll()?;
        self.inner.load_session()
    }

    fn clear_session(&self) -> Result<(), StoreError> {
        self.roll()?;
        self.inner.clear_session()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn test_zero_rate_never_fails() {
        let store = ChaoticStore::new(MemoryStore::new(), 0.0);
        for id in 0..100 {
            store.store_room(&Room::new(id, 0)).expect("never fails");
        }
        assert_eq!(store.operation_count(), 100);
        assert_eq!(store.inner().list_rooms().expect("list").len(), 100);
    }

    #[test]
    fn test_full_rate_always_fails() {
        let store = ChaoticStore::new(MemoryStore::new(), 1.0);
        let result = store.list_rooms();
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(result.is_err_and(|e| e.is_transient()));
    }

    #[test]
    fn test_same_seed_same_failures() {
        let outcomes = |seed| {
            let store = ChaoticStore::with_seed(MemoryStore::new(), 0.5, seed);
            (0..64).map(|_| store.list_rooms().is_ok()).collect::<Vec<_>>()
        };

        let first = outcomes(42);
        assert_eq!(first, outcomes(42));
        assert!(first.iter().any(|ok| *ok));
        assert!(first.iter().any(|ok| !*ok));
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between")]
    fn test_rejects_invalid_rate() {
        let _ = ChaoticStore::new(MemoryStore::new(), 1.5);
    }
}
