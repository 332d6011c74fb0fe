//! Binding of an observable collection to a list surface.
//!
//! A [`ListBinding`] owns at most one live [`Subscription`]. It replays every
//! delivered [`ChangeSet`] against its own row model and mirrors it onto a
//! [`ListSurface`] as row-range operations, keeping the selection attached to
//! the selected item's identity.
//!
//! # Invariants
//!
//! - Rebinding invalidates the old subscription before the new one exists.
//! - After every change set the surface shows exactly as many rows as the
//!   binding's row model holds, or the change is reported as
//!   [`BindingError::SurfaceOutOfSync`].
//! - Async enrichment reaches a view only while the view's slot still carries
//!   the epoch it was configured with.

use std::{ops::Range, sync::Arc};

use entropy_core::{ChangeSet, CollectionError, Item, ObservableCollection, Renderable, Subscription};

use crate::{
    BindingError, CellRegistry, EnrichmentRequest, Formatters, ListSurface, Media, SlotStamp,
    ViewList, error::BackendError,
};

/// Async work for a configured row, stamped with the slot it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentTicket {
    /// Slot and epoch at configuration time
    pub stamp: SlotStamp,
    /// What to fetch
    pub request: EnrichmentRequest,
}

/// Drives one [`ListSurface`] from one collection at a time.
#[derive(Debug)]
pub struct ListBinding<T: Item + Renderable> {
    /// Name used in logs
    name: &'static str,
    subscription: Option<Subscription<T>>,
    /// Rows as delivered so far
    rows: Vec<T>,
    selected: Option<T::Id>,
    registry: CellRegistry<T>,
    formatters: Arc<Formatters>,
}

impl<T: Item + Renderable> ListBinding<T> {
    /// Create an unbound binding.
    pub fn new(name: &'static str, registry: CellRegistry<T>, formatters: Arc<Formatters>) -> Self {
        Self { name, subscription: None, rows: Vec::new(), selected: None, registry, formatters }
    }

    /// Observe `collection`, dropping any previous one.
    ///
    /// The first [`pump`](Self::pump) afterwards reloads the surface.
    pub fn bind(&mut self, collection: &ObservableCollection<T>) {
        self.unbind();
        let subscription = collection.add_observer();
        tracing::debug!(binding = self.name, subscription = %subscription.id(), "bound");
        self.subscription = Some(subscription);
    }

    /// Stop observing. Nothing queued for the old subscription is delivered.
    ///
    /// The row model is emptied; the surface keeps its rows until the caller
    /// reloads it or the next bind's reload arrives.
    pub fn unbind(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.invalidate();
            tracing::debug!(binding = self.name, subscription = %subscription.id(), "unbound");
        }
        self.rows.clear();
        self.selected = None;
    }

    /// Whether a live subscription is held.
    pub fn is_bound(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// Deliver every queued change set to `surface`.
    ///
    /// A selected item that is removed and re-inserted within one pump (a
    /// move) stays selected. Returns the number of change sets applied.
    pub fn pump<S: ListSurface>(&mut self, surface: &mut S) -> Result<usize, BindingError> {
        let mut applied = 0;
        while let Some(change) = self.subscription.as_ref().and_then(Subscription::next_change) {
            self.apply(change, surface)?;
            applied += 1;
        }
        if self.selected_row().is_none() {
            self.selected = None;
        }
        Ok(applied)
    }

    /// Apply one change set to the row model and the surface.
    ///
    /// # Errors
    ///
    /// - [`BindingError::Collection`] if the change references rows that do
    ///   not exist in the row model
    /// - [`BindingError::SurfaceOutOfSync`] if the surface's row count differs
    ///   from the row model afterwards
    pub fn apply<S: ListSurface>(
        &mut self,
        change: ChangeSet<T>,
        surface: &mut S,
    ) -> Result<(), BindingError> {
        tracing::trace!(binding = self.name, kind = change.kind(), rows = change.len(), "apply");
        change.apply_to(&mut self.rows)?;

        match &change {
            ChangeSet::Reload { items } => surface.reload_all(items.len()),
            ChangeSet::Remove { indices } => {
                for run in descending_runs(indices) {
                    surface.remove_rows(run);
                }
            },
            ChangeSet::Insert { rows } => {
                for run in ascending_runs(rows.iter().map(|(index, _)| *index)) {
                    surface.insert_rows(run);
                }
            },
            ChangeSet::Update { rows } => {
                for run in ascending_runs(rows.iter().map(|(index, _)| *index)) {
                    surface.reload_rows(run);
                }
            },
        }

        let actual = surface.row_count();
        if actual != self.rows.len() {
            tracing::warn!(binding = self.name, expected = self.rows.len(), actual, "surface out of sync");
            return Err(BindingError::SurfaceOutOfSync { expected: self.rows.len(), actual });
        }

        self.restore_selection(surface, change.is_reload());
        Ok(())
    }

    /// Highlight the selected identity at its current row, if present.
    ///
    /// A missing identity is remembered (it may be re-inserted by the next
    /// change set of a move) unless `forget_missing` is set.
    fn restore_selection<S: ListSurface>(&mut self, surface: &mut S, forget_missing: bool) {
        let row = self.selected_row();
        if row.is_none() && forget_missing {
            self.selected = None;
        }
        if surface.selected_row() != row {
            surface.select_row(row);
        }
    }

    /// Rows in the row model.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Item shown at `row`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::OutOfRange`] if the row does not exist.
    pub fn item(&self, row: usize) -> Result<&T, CollectionError> {
        self.rows.get(row).ok_or(CollectionError::OutOfRange { index: row, count: self.rows.len() })
    }

    /// All rows in order.
    pub fn items(&self) -> &[T] {
        &self.rows
    }

    /// Select `row` and return its item.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::OutOfRange`] if the row does not exist.
    pub fn select_row<S: ListSurface>(
        &mut self,
        row: usize,
        surface: &mut S,
    ) -> Result<&T, BindingError> {
        let item = self
            .rows
            .get(row)
            .ok_or(CollectionError::OutOfRange { index: row, count: self.rows.len() })?;
        self.selected = Some(item.id());
        surface.select_row(Some(row));
        Ok(item)
    }

    /// Clear the selection.
    pub fn clear_selection<S: ListSurface>(&mut self, surface: &mut S) {
        self.selected = None;
        surface.select_row(None);
    }

    /// Currently selected item.
    pub fn selected_item(&self) -> Option<&T> {
        let id = self.selected.as_ref()?;
        self.rows.iter().find(|item| &item.id() == id)
    }

    /// Row of the selected item.
    pub fn selected_row(&self) -> Option<usize> {
        let id = self.selected.as_ref()?;
        self.rows.iter().position(|item| &item.id() == id)
    }

    /// Configure the view shown at `row` for the item at `row`.
    ///
    /// Picks the cell strategy by the item's render kind, resets the view and
    /// lets the strategy fill it. Returns tickets for the enrichment the row
    /// asked for, stamped with the slot's new epoch.
    pub fn configure_row(
        &self,
        row: usize,
        list: &mut ViewList,
    ) -> Result<Vec<EnrichmentTicket>, BindingError> {
        let item = self.item(row)?;
        let kind = item.render_kind();
        let strategy = self.registry.get(kind).ok_or(BindingError::NoConfigurator(kind))?;

        let shown = list.row_count();
        let (stamp, view) =
            list.prepare(row).ok_or(CollectionError::OutOfRange { index: row, count: shown })?;
        view.reset(kind);

        let tickets = strategy
            .configure(item, view, &self.formatters)
            .into_iter()
            .map(|request| EnrichmentTicket { stamp, request })
            .collect();
        Ok(tickets)
    }

    /// Configure every row the list marked dirty.
    pub fn configure_dirty(&self, list: &mut ViewList) -> Result<Vec<EnrichmentTicket>, BindingError> {
        let mut tickets = Vec::new();
        for row in list.take_dirty() {
            tickets.extend(self.configure_row(row, list)?);
        }
        Ok(tickets)
    }

    /// Hand an enrichment result to the view it was issued for.
    ///
    /// Returns `true` if the view was updated. Results for slots that were
    /// reconfigured or recycled since the ticket was issued are dropped, as
    /// are failed fetches.
    pub fn complete_enrichment(
        &self,
        ticket: &EnrichmentTicket,
        result: Result<Media, BackendError>,
        list: &mut ViewList,
    ) -> bool {
        let Some(view) = list.view_at(ticket.stamp) else {
            tracing::trace!(binding = self.name, slot = %ticket.stamp.slot, "dropping stale enrichment");
            return false;
        };

        let media = match result {
            Ok(media) => media,
            Err(error) => {
                tracing::debug!(binding = self.name, request = ?ticket.request, %error, "enrichment failed");
                return false;
            },
        };

        match ticket.request {
            EnrichmentRequest::Avatar { .. } => view.avatar = Some(media),
            EnrichmentRequest::Thumbnail { .. } => view.thumbnail = Some(media),
        }
        true
    }
}

/// Group strictly decreasing indices into row ranges, highest first.
fn descending_runs(indices: &[usize]) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    for &index in indices {
        match runs.last_mut() {
            Some(run) if run.start == index + 1 => run.start = index,
            _ => runs.push(index..index + 1),
        }
    }
    runs
}

/// Group strictly increasing indices into row ranges, lowest first.
fn ascending_runs(indices: impl Iterator<Item = usize>) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    for index in indices {
        match runs.last_mut() {
            Some(run) if run.end == index => run.end = index + 1,
            _ => runs.push(index..index + 1),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use entropy_core::{Identified, Mutation, RenderKind};

    use super::*;
    use crate::{CellConfigurator, RowView};

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: u32,
        text: &'static str,
    }

    impl Identified for Note {
        type Id = u32;
        fn id(&self) -> u32 {
            self.id
        }
    }

    impl Renderable for Note {
        fn render_kind(&self) -> RenderKind {
            RenderKind::Text
        }
    }

    struct NoteCell;

    impl CellConfigurator<Note> for NoteCell {
        fn configure(&self, note: &Note, view: &mut RowView, _: &Formatters) -> Vec<EnrichmentRequest> {
            view.title = note.text.to_string();
            vec![EnrichmentRequest::Avatar { user_id: format!("@{}:x", note.id) }]
        }
    }

    fn note(id: u32, text: &'static str) -> Note {
        Note { id, text }
    }

    fn binding() -> ListBinding<Note> {
        ListBinding::new(
            "notes",
            CellRegistry::new().with(RenderKind::Text, NoteCell),
            Arc::new(Formatters::default()),
        )
    }

    #[test]
    fn runs_are_grouped() {
        assert_eq!(descending_runs(&[5, 4, 3, 1]), vec![3..6, 1..2]);
        assert_eq!(ascending_runs([2, 3, 5].into_iter()), vec![2..4, 5..6]);
        assert!(descending_runs(&[]).is_empty());
    }

    #[test]
    fn bind_reloads_surface() {
        let collection =
            ObservableCollection::with_items((0..5).map(|id| note(id, "n")).collect()).expect("unique");
        let mut binding = binding();
        let mut list = ViewList::new();

        binding.bind(&collection);
        assert_eq!(binding.pump(&mut list).expect("pump"), 1);

        assert_eq!(list.row_count(), 5);
        assert_eq!(binding.count(), 5);
    }

    #[test]
    fn selection_follows_identity() {
        let collection =
            ObservableCollection::with_items(vec![note(1, "a"), note(2, "b"), note(3, "c")])
                .expect("unique");
        let mut binding = binding();
        let mut list = ViewList::new();
        binding.bind(&collection);
        binding.pump(&mut list).expect("pump");

        binding.select_row(2, &mut list).expect("select");
        collection.apply(Mutation::Remove(1)).expect("remove");
        binding.pump(&mut list).expect("pump");

        assert_eq!(list.selected_row(), Some(1));
        assert_eq!(binding.selected_item(), Some(&note(3, "c")));

        collection.apply(Mutation::Remove(3)).expect("remove");
        binding.pump(&mut list).expect("pump");

        assert_eq!(list.selected_row(), None);
        assert_eq!(binding.selected_item(), None);
    }

    #[test]
    fn moved_item_stays_selected() {
        let collection =
            ObservableCollection::with_items(vec![note(1, "a"), note(2, "b"), note(3, "c")])
                .expect("unique");
        let mut binding = binding();
        let mut list = ViewList::new();
        binding.bind(&collection);
        binding.pump(&mut list).expect("pump");
        binding.select_row(0, &mut list).expect("select");

        collection
            .apply(Mutation::Replace(vec![note(2, "b"), note(3, "c"), note(1, "a")]))
            .expect("move");
        binding.pump(&mut list).expect("pump");

        assert_eq!(binding.selected_item(), Some(&note(1, "a")));
        assert_eq!(list.selected_row(), Some(2));
    }

    #[test]
    fn update_keeps_count_and_selection() {
        let collection =
            ObservableCollection::with_items(vec![note(1, "a"), note(2, "b")]).expect("unique");
        let mut binding = binding();
        let mut list = ViewList::new();
        binding.bind(&collection);
        binding.pump(&mut list).expect("pump");
        binding.configure_dirty(&mut list).expect("configure");
        binding.select_row(1, &mut list).expect("select");

        collection.apply(Mutation::Upsert(note(2, "b2"))).expect("upsert");
        binding.pump(&mut list).expect("pump");

        assert_eq!(list.row_count(), 2);
        assert_eq!(list.selected_row(), Some(1));
        assert_eq!(list.take_dirty(), vec![1]);
    }

    #[test]
    fn foreign_row_changes_are_detected() {
        let collection = ObservableCollection::with_items(vec![note(1, "a")]).expect("unique");
        let mut binding = binding();
        let mut list = ViewList::new();
        binding.bind(&collection);
        binding.pump(&mut list).expect("pump");

        list.insert_rows(0..1);
        collection.apply(Mutation::Append(note(2, "b"))).expect("append");

        assert_eq!(
            binding.pump(&mut list),
            Err(BindingError::SurfaceOutOfSync { expected: 2, actual: 3 })
        );
    }

    #[test]
    fn rebinding_drops_old_deliveries() {
        let first = ObservableCollection::with_items(vec![note(1, "a")]).expect("unique");
        let second = ObservableCollection::with_items(vec![note(9, "z")]).expect("unique");
        let mut binding = binding();
        let mut list = ViewList::new();

        binding.bind(&first);
        first.apply(Mutation::Append(note(2, "b"))).expect("append");
        binding.bind(&second);
        binding.pump(&mut list).expect("pump");

        assert_eq!(binding.items(), &[note(9, "z")]);
        assert_eq!(first.observer_count(), 0);
    }

    #[test]
    fn stale_enrichment_is_dropped() {
        let collection =
            ObservableCollection::with_items(vec![note(1, "x")]).expect("unique");
        let mut binding = binding();
        let mut list = ViewList::new();
        binding.bind(&collection);
        binding.pump(&mut list).expect("pump");

        let tickets = binding.configure_dirty(&mut list).expect("configure");
        let for_x = tickets[0].clone();

        // The same slot is reconfigured for another item before the fetch returns
        collection.apply(Mutation::Replace(vec![note(2, "y")])).expect("replace");
        binding.pump(&mut list).expect("pump");
        let for_y = binding.configure_dirty(&mut list).expect("configure");

        let media = Media { source: "x".into(), mimetype: None, data: vec![1] };
        assert!(!binding.complete_enrichment(&for_x, Ok(media.clone()), &mut list));
        assert_eq!(list.view(0).and_then(|view| view.avatar.clone()), None);

        assert!(binding.complete_enrichment(&for_y[0], Ok(media.clone()), &mut list));
        assert_eq!(list.view(0).and_then(|view| view.avatar.clone()), Some(media));
    }
}
