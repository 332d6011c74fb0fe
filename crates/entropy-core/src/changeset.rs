//! Granular change descriptions and identity diffing.
//!
//! A [`ChangeSet`] describes one step between two observed states of an
//! ordered collection. [`diff`] produces the steps between two snapshots as a
//! sequence that replays deterministically against a live row count:
//!
//! 1. `Remove` with indices against the old state, strictly decreasing.
//! 2. `Insert` with indices against the new state, strictly increasing.
//! 3. `Update` with indices against the new state, strictly increasing.
//!
//! Items that survive but move relative to the other survivors are reported as
//! a removal plus an insertion. Survivors that keep their relative order are
//! found with a longest increasing subsequence over their new positions, so a
//! single removal does not turn every following row into a move.

use std::collections::HashMap;

use crate::{CollectionError, Item};

/// One step of change between two observed collection states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet<T> {
    /// Discard all incremental state; the collection now holds `items`.
    Reload {
        /// Full contents after the change
        items: Vec<T>,
    },

    /// Rows removed, indices against the state before the change.
    ///
    /// Strictly decreasing.
    Remove {
        /// Row indices, highest first
        indices: Vec<usize>,
    },

    /// Rows inserted, indices against the state after the change.
    ///
    /// Strictly increasing.
    Insert {
        /// `(index, item)` pairs, lowest index first
        rows: Vec<(usize, T)>,
    },

    /// Rows whose content changed in place.
    ///
    /// Identity, position and row count are unchanged.
    Update {
        /// `(index, item)` pairs, lowest index first
        rows: Vec<(usize, T)>,
    },
}

impl<T> ChangeSet<T> {
    /// Whether this is a full reload.
    pub fn is_reload(&self) -> bool {
        matches!(self, Self::Reload { .. })
    }

    /// Number of rows this change touches (the full length for a reload).
    pub fn len(&self) -> usize {
        match self {
            Self::Reload { items } => items.len(),
            Self::Remove { indices } => indices.len(),
            Self::Insert { rows } | Self::Update { rows } => rows.len(),
        }
    }

    /// Whether this change touches no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reload { .. } => "reload",
            Self::Remove { .. } => "remove",
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
        }
    }
}

impl<T: Clone> ChangeSet<T> {
    /// Replay this change against a row model.
    ///
    /// Applies removals in the order given (highest first) and insertions in
    /// the order given (lowest first), checking every index against the live
    /// length.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::OutOfRange`] if an index is invalid for the
    /// row model at the moment it is applied. The model may be partially
    /// updated in that case.
    pub fn apply_to(&self, rows: &mut Vec<T>) -> Result<(), CollectionError> {
        match self {
            Self::Reload { items } => {
                rows.clone_from(items);
            },
            Self::Remove { indices } => {
                for &index in indices {
                    if index >= rows.len() {
                        return Err(CollectionError::OutOfRange { index, count: rows.len() });
                    }
                    rows.remove(index);
                }
            },
            Self::Insert { rows: inserted } => {
                for (index, item) in inserted {
                    if *index > rows.len() {
                        return Err(CollectionError::OutOfRange { index: *index, count: rows.len() });
                    }
                    rows.insert(*index, item.clone());
                }
            },
            Self::Update { rows: updated } => {
                for (index, item) in updated {
                    let count = rows.len();
                    let slot = rows
                        .get_mut(*index)
                        .ok_or(CollectionError::OutOfRange { index: *index, count })?;
                    *slot = item.clone();
                }
            },
        }
        Ok(())
    }
}

/// Limits above which a diff falls back to a single reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffConfig {
    /// Maximum removals plus insertions reported individually.
    pub max_changes: usize,
    /// Maximum combined length of old and new state that is diffed at all.
    pub max_len: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self { max_changes: 256, max_len: 20_000 }
    }
}

/// Compute the change steps from `old` to `new` by item identity.
///
/// Returns an empty vector when nothing changed. Both slices must hold unique
/// identities; [`crate::ObservableCollection`] enforces that before diffing.
pub fn diff<T: Item>(old: &[T], new: &[T], config: &DiffConfig) -> Vec<ChangeSet<T>> {
    if old.len() + new.len() > config.max_len {
        tracing::debug!(old = old.len(), new = new.len(), "diff too large, reloading");
        return vec![ChangeSet::Reload { items: new.to_vec() }];
    }

    let new_positions: HashMap<T::Id, usize> =
        new.iter().enumerate().map(|(index, item)| (item.id(), index)).collect();

    // (old index, new index) of every surviving identity, in old order
    let survivors: Vec<(usize, usize)> = old
        .iter()
        .enumerate()
        .filter_map(|(i, item)| new_positions.get(&item.id()).map(|&j| (i, j)))
        .collect();

    let new_order: Vec<usize> = survivors.iter().map(|&(_, j)| j).collect();
    let stable = longest_increasing(&new_order);

    let mut kept_old = vec![false; old.len()];
    let mut kept_new = vec![false; new.len()];
    let mut updated = Vec::new();

    for (&(i, j), _) in survivors.iter().zip(&stable).filter(|(_, is_stable)| **is_stable) {
        kept_old[i] = true;
        kept_new[j] = true;
        if old[i] != new[j] {
            updated.push((j, new[j].clone()));
        }
    }

    let removed: Vec<usize> = (0..old.len()).rev().filter(|&i| !kept_old[i]).collect();
    let inserted: Vec<(usize, T)> =
        (0..new.len()).filter(|&j| !kept_new[j]).map(|j| (j, new[j].clone())).collect();

    if removed.len() + inserted.len() > config.max_changes {
        tracing::debug!(
            removed = removed.len(),
            inserted = inserted.len(),
            "change volume above threshold, reloading"
        );
        return vec![ChangeSet::Reload { items: new.to_vec() }];
    }

    let mut changes = Vec::with_capacity(3);
    if !removed.is_empty() {
        changes.push(ChangeSet::Remove { indices: removed });
    }
    if !inserted.is_empty() {
        changes.push(ChangeSet::Insert { rows: inserted });
    }
    if !updated.is_empty() {
        changes.push(ChangeSet::Update { rows: updated });
    }
    changes
}

/// Flags the members of one longest strictly increasing subsequence.
fn longest_increasing(values: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];

    for (k, &value) in values.iter().enumerate() {
        let pos = tails.partition_point(|&t| values[t] < value);
        if pos > 0 {
            previous[k] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(k);
        } else {
            tails[pos] = k;
        }
    }

    let mut flags = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(k) = cursor {
        flags[k] = true;
        cursor = previous[k];
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Identified;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row {
        id: u32,
        body: &'static str,
    }

    impl Identified for Row {
        type Id = u32;
        fn id(&self) -> u32 {
            self.id
        }
    }

    fn row(id: u32, body: &'static str) -> Row {
        Row { id, body }
    }

    fn replay(old: &[Row], changes: &[ChangeSet<Row>]) -> Vec<Row> {
        let mut rows = old.to_vec();
        for change in changes {
            change.apply_to(&mut rows).expect("replay failed");
        }
        rows
    }

    #[test]
    fn remove_middle_and_append() {
        let old = vec![row(1, "a"), row(2, "b"), row(3, "c")];
        let new = vec![row(1, "a"), row(3, "c"), row(4, "d")];

        let changes = diff(&old, &new, &DiffConfig::default());

        assert_eq!(changes, vec![
            ChangeSet::Remove { indices: vec![1] },
            ChangeSet::Insert { rows: vec![(2, row(4, "d"))] },
        ]);
        assert_eq!(replay(&old, &changes), new);
    }

    #[test]
    fn content_change_is_update_in_place() {
        let old = vec![row(1, "a"), row(2, "b")];
        let new = vec![row(1, "a"), row(2, "edited")];

        let changes = diff(&old, &new, &DiffConfig::default());

        assert_eq!(changes, vec![ChangeSet::Update { rows: vec![(1, row(2, "edited"))] }]);
    }

    #[test]
    fn moved_item_is_remove_then_insert() {
        let old = vec![row(1, "a"), row(2, "b"), row(3, "c")];
        let new = vec![row(3, "c"), row(1, "a"), row(2, "b")];

        let changes = diff(&old, &new, &DiffConfig::default());

        assert_eq!(changes, vec![
            ChangeSet::Remove { indices: vec![2] },
            ChangeSet::Insert { rows: vec![(0, row(3, "c"))] },
        ]);
        assert_eq!(replay(&old, &changes), new);
    }

    #[test]
    fn unchanged_state_produces_nothing() {
        let rows = vec![row(1, "a"), row(2, "b")];
        assert!(diff(&rows, &rows, &DiffConfig::default()).is_empty());
    }

    #[test]
    fn removals_are_descending_and_insertions_ascending() {
        let old = vec![row(1, "a"), row(2, "b"), row(3, "c"), row(4, "d")];
        let new = vec![row(5, "e"), row(2, "b"), row(6, "f"), row(7, "g")];

        let changes = diff(&old, &new, &DiffConfig::default());

        let Some(ChangeSet::Remove { indices }) = changes.first() else {
            panic!("expected removal first, got {changes:?}");
        };
        assert!(indices.windows(2).all(|w| w[0] > w[1]));

        let Some(ChangeSet::Insert { rows }) = changes.get(1) else {
            panic!("expected insertion second, got {changes:?}");
        };
        assert!(rows.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(replay(&old, &changes), new);
    }

    #[test]
    fn bulk_change_falls_back_to_reload() {
        let old: Vec<Row> = (0..10).map(|i| row(i, "old")).collect();
        let new: Vec<Row> = (100..110).map(|i| row(i, "new")).collect();
        let config = DiffConfig { max_changes: 5, ..DiffConfig::default() };

        let changes = diff(&old, &new, &config);

        assert_eq!(changes, vec![ChangeSet::Reload { items: new.clone() }]);
    }

    #[test]
    fn oversized_input_falls_back_to_reload() {
        let old: Vec<Row> = (0..4).map(|i| row(i, "x")).collect();
        let config = DiffConfig { max_len: 6, ..DiffConfig::default() };

        let changes = diff(&old, &old, &config);

        assert!(matches!(changes.as_slice(), [ChangeSet::Reload { .. }]));
    }

    #[test]
    fn apply_rejects_stale_index() {
        let mut rows = vec![row(1, "a")];
        let result = ChangeSet::<Row>::Remove { indices: vec![3] }.apply_to(&mut rows);

        assert_eq!(result, Err(CollectionError::OutOfRange { index: 3, count: 1 }));
    }

    #[test]
    fn reload_twice_is_idempotent() {
        let mut rows = vec![row(9, "z")];
        let reload = ChangeSet::Reload { items: vec![row(1, "a"), row(2, "b")] };

        reload.apply_to(&mut rows).expect("first reload");
        let after_first = rows.clone();
        reload.apply_to(&mut rows).expect("second reload");

        assert_eq!(rows, after_first);
    }

    #[test]
    fn longest_increasing_picks_stable_run() {
        assert_eq!(longest_increasing(&[0, 2, 1, 3]).iter().filter(|f| **f).count(), 3);
        assert_eq!(longest_increasing(&[]), Vec::<bool>::new());
        assert_eq!(longest_increasing(&[2, 1, 0]).iter().filter(|f| **f).count(), 1);
    }
}
