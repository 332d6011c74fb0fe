//! Property-based tests for ObservableCollection.
//!
//! Every test replays delivered change sets against a plain `Vec` row model
//! and compares it with the collection's true order.

use entropy_core::{
    ChangeSet, CollectionError, DiffConfig, Identified, Mutation, ObservableCollection,
};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    id: u8,
    rev: u8,
}

impl Identified for Entry {
    type Id = u8;
    fn id(&self) -> u8 {
        self.id
    }
}

/// Generate random mutations over a small identity space.
fn mutation_strategy() -> impl Strategy<Value = Mutation<Entry>> {
    prop_oneof![
        3 => (0u8..24, any::<u8>()).prop_map(|(id, rev)| Mutation::Append(Entry { id, rev })),
        3 => (0u8..24, any::<u8>()).prop_map(|(id, rev)| Mutation::Upsert(Entry { id, rev })),
        2 => (0u8..24).prop_map(Mutation::Remove),
        1 => prop::sample::subsequence((0u8..24).collect::<Vec<_>>(), 0..24)
            .prop_shuffle()
            .prop_map(|ids| Mutation::Replace(ids.into_iter().map(|id| Entry { id, rev: 0 }).collect())),
    ]
}

fn initial(len: u8) -> Vec<Entry> {
    (0..len).map(|id| Entry { id, rev: 0 }).collect()
}

fn replay(model: &mut Vec<Entry>, changes: Vec<ChangeSet<Entry>>) -> Result<(), CollectionError> {
    for change in changes {
        change.apply_to(model)?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: replaying every delivered change reproduces the true order
    #[test]
    fn prop_replay_matches_collection(
        start in 0u8..12,
        mutations in prop::collection::vec(mutation_strategy(), 0..40),
    ) {
        let collection = ObservableCollection::with_items(initial(start))?;
        let subscription = collection.add_observer();
        let mut model = Vec::new();

        for mutation in mutations {
            // Duplicate appends are rejected; the collection must stay intact
            let _ = collection.apply(mutation);
            replay(&mut model, subscription.drain())?;
            prop_assert_eq!(&model, &collection.snapshot());
        }
    }

    /// Property: a tiny change threshold still converges through reloads
    #[test]
    fn prop_reload_fallback_converges(
        mutations in prop::collection::vec(mutation_strategy(), 0..30),
    ) {
        let config = DiffConfig { max_changes: 1, max_len: 16 };
        let collection = ObservableCollection::with_config(initial(6), config)?;
        let subscription = collection.add_observer();
        let mut model = Vec::new();

        for mutation in mutations {
            let _ = collection.apply(mutation);
        }
        replay(&mut model, subscription.drain())?;

        prop_assert_eq!(model, collection.snapshot());
    }

    /// Property: removal indices are strictly decreasing and always in range
    #[test]
    fn prop_removals_descend_within_range(
        start in 1u8..20,
        keep in prop::collection::vec(any::<bool>(), 20),
    ) {
        let collection = ObservableCollection::with_items(initial(start))?;
        let subscription = collection.add_observer();
        let mut live_rows = subscription.drain().iter().map(ChangeSet::len).sum::<usize>();

        let survivors: Vec<Entry> =
            initial(start).into_iter().zip(&keep).filter(|(_, k)| **k).map(|(e, _)| e).collect();
        collection.apply(Mutation::Replace(survivors))?;

        for change in subscription.drain() {
            if let ChangeSet::Remove { indices } = change {
                prop_assert!(indices.windows(2).all(|w| w[0] > w[1]));
                for index in indices {
                    prop_assert!(index < live_rows);
                    live_rows -= 1;
                }
            }
        }
        prop_assert_eq!(live_rows, collection.count());
    }

    /// Property: invalidating one subscription never affects another
    #[test]
    fn prop_subscription_isolation(
        mutations in prop::collection::vec(mutation_strategy(), 1..20),
        cut in 0usize..20,
    ) {
        let collection = ObservableCollection::with_items(initial(4))?;
        let mut first = collection.add_observer();
        let second = collection.add_observer();
        let mut model = Vec::new();

        for (step, mutation) in mutations.into_iter().enumerate() {
            if step == cut {
                first.invalidate();
            }
            let _ = collection.apply(mutation);
            replay(&mut model, second.drain())?;
        }

        prop_assert_eq!(model, collection.snapshot());
        prop_assert!(second.is_active());
    }
}

#[test]
fn scenario_remove_b_append_d() {
    let a = Entry { id: 1, rev: 0 };
    let b = Entry { id: 2, rev: 0 };
    let c = Entry { id: 3, rev: 0 };
    let d = Entry { id: 4, rev: 0 };
    let collection =
        ObservableCollection::with_items(vec![a.clone(), b, c.clone()]).expect("unique");
    let subscription = collection.add_observer();
    let mut model = Vec::new();
    replay(&mut model, subscription.drain()).expect("initial reload");

    collection
        .apply(Mutation::Replace(vec![a.clone(), c.clone(), d.clone()]))
        .expect("replace");
    let changes = subscription.drain();

    assert_eq!(changes, vec![
        ChangeSet::Remove { indices: vec![1] },
        ChangeSet::Insert { rows: vec![(2, d.clone())] },
    ]);
    replay(&mut model, changes).expect("replay");
    assert_eq!(model, vec![a, c, d]);
}

#[test]
fn reload_subsumes_queued_diffs() {
    let collection = ObservableCollection::with_items(initial(3)).expect("unique");
    let subscription = collection.add_observer();

    collection.apply(Mutation::Append(Entry { id: 10, rev: 0 })).expect("append");
    collection.degrade();

    assert_eq!(subscription.drain(), vec![ChangeSet::Reload { items: Vec::new() }]);
}

#[test]
fn deliveries_are_fifo() {
    let collection = ObservableCollection::<Entry>::new();
    let subscription = collection.add_observer();
    let _ = subscription.drain();

    for id in 0..5 {
        collection.apply(Mutation::Append(Entry { id, rev: 0 })).expect("append");
    }

    let inserted: Vec<u8> = subscription
        .drain()
        .into_iter()
        .map(|change| match change {
            ChangeSet::Insert { rows } => rows[0].1.id,
            other => panic!("unexpected change {other:?}"),
        })
        .collect();
    assert_eq!(inserted, vec![0, 1, 2, 3, 4]);
}
