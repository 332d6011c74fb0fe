//! Chaos property tests for persisted lists
//!
//! These tests refresh lists through `ChaoticStore` and check that:
//! - A failed read always leaves the list degraded and empty, never panics
//! - A successful read always converges to the store's true contents
//! - Observers replaying every delivered change end up with the same rows

use entropy_core::{ChangeSet, DiffConfig};
use entropy_store::{
    ChaoticStore, MemoryStore, Message, ObservablePersistedList, RedbStore, RefreshError, Room,
    Store, StoreError, User,
};
use proptest::prelude::*;
use tempfile::tempdir;

fn alice() -> User {
    User::new("@alice:example.org", "Alice")
}

fn replay(model: &mut Vec<Message>, changes: Vec<ChangeSet<Message>>) {
    for change in changes {
        change.apply_to(model).expect("delivered change must replay");
    }
}

#[test]
fn prop_chaotic_refresh_degrades_or_converges() {
    proptest!(|(
        failure_rate in 0.0..0.9,
        seed in any::<u64>(),
        writes in prop::collection::vec((0u8..16, any::<i16>()), 1..40),
    )| {
        let memory = MemoryStore::new();
        memory.store_room(&Room::new(1, 0)).expect("store room");
        let chaotic = ChaoticStore::with_seed(memory.clone(), failure_rate, seed);

        let timeline = ObservablePersistedList::messages(chaotic, 1, DiffConfig::default());
        let subscription = timeline.add_observer();
        let mut model = Vec::new();

        for (event, timestamp) in writes {
            let message =
                Message::text(format!("${event}"), 1, alice(), "hi", i64::from(timestamp));
            memory.store_message(&message).expect("store message");

            match timeline.refresh() {
                Ok(_) => {
                    prop_assert!(!timeline.is_degraded());
                    prop_assert_eq!(
                        timeline.collection().snapshot(),
                        memory.load_messages(1).expect("load")
                    );
                },
                Err(RefreshError::Store(StoreError::Io(_))) => {
                    prop_assert!(timeline.is_degraded());
                    prop_assert_eq!(timeline.count(), 0);
                },
                Err(e) => panic!("Unexpected error: {e:?}"),
            }

            replay(&mut model, subscription.drain());
            prop_assert_eq!(&model, &timeline.collection().snapshot());
        }
    });
}

#[test]
fn degraded_list_recovers_on_next_good_read() {
    let memory = MemoryStore::new();
    memory.store_room(&Room::new(1, 0)).expect("store room");
    memory.store_room(&Room::new(2, 5)).expect("store room");

    let broken = ObservablePersistedList::rooms(
        ChaoticStore::new(memory.clone(), 1.0),
        DiffConfig::default(),
    );
    assert!(broken.refresh().is_err());
    assert!(broken.is_degraded());
    assert_eq!(broken.count(), 0);

    let healthy = ObservablePersistedList::rooms(memory, DiffConfig::default());
    let subscription = healthy.add_observer();
    healthy.refresh().expect("refresh");
    assert!(!healthy.is_degraded());
    assert_eq!(healthy.count(), 2);

    let delivered: usize = subscription.drain().iter().map(ChangeSet::len).sum();
    assert_eq!(delivered, 2);
}

#[test]
fn redb_backed_list_survives_reopen() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("entropy.redb");

    {
        let store = RedbStore::open(&path).expect("open");
        store.store_room(&Room::new(7, 0).with_name("lobby")).expect("store room");
        for i in 0..3 {
            store
                .store_message(&Message::text(format!("$e{i}"), 7, alice(), "hello", i))
                .expect("store message");
        }
    }

    let store = RedbStore::open(&path).expect("reopen");
    let rooms = ObservablePersistedList::rooms(store.clone(), DiffConfig::default());
    let timeline = ObservablePersistedList::messages(store, 7, DiffConfig::default());
    rooms.refresh().expect("refresh rooms");
    timeline.refresh().expect("refresh timeline");

    assert_eq!(rooms.item(0).expect("room").smart_name(), "lobby");
    assert_eq!(timeline.count(), 3);
    assert_eq!(timeline.item(2).expect("message").event_id, "$e2");
}
