//! List surfaces.
//!
//! [`ListSurface`] is the toolkit-facing side of a list: row counts and
//! row-range operations. [`ViewList`] is the reference surface: it keeps one
//! recycled [`RowView`] slot per row and remembers which rows need to be
//! (re)configured before the next draw.

use std::{fmt, ops::Range};

use crate::RowView;

/// A list UI that can be driven row by row.
pub trait ListSurface {
    /// Rows currently shown.
    fn row_count(&self) -> usize;

    /// Throw away all rows and show `count` fresh ones.
    fn reload_all(&mut self, count: usize);

    /// Insert rows so that they occupy `rows` afterwards.
    fn insert_rows(&mut self, rows: Range<usize>);

    /// Remove the rows currently at `rows`.
    fn remove_rows(&mut self, rows: Range<usize>);

    /// Redraw the rows at `rows`; count unchanged.
    fn reload_rows(&mut self, rows: Range<usize>);

    /// Highlighted row, if any.
    fn selected_row(&self) -> Option<usize>;

    /// Highlight `row`, or nothing.
    fn select_row(&mut self, row: Option<usize>);
}

/// Identity of a recycled row view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// A slot as configured at a point in time.
///
/// Async work records this and may only touch the view while the slot still
/// carries the same epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStamp {
    /// Slot
    pub slot: SlotId,
    /// Epoch at configuration time
    pub epoch: u64,
}

#[derive(Debug)]
struct Slot {
    id: SlotId,
    /// Advances whenever the view is reconfigured or recycled
    epoch: u64,
    view: RowView,
    dirty: bool,
}

/// Reference [`ListSurface`] with recycled row views.
#[derive(Debug, Default)]
pub struct ViewList {
    /// One slot per row, in row order
    rows: Vec<Slot>,
    /// Recycled slots, keeping whatever they showed last
    pool: Vec<Slot>,
    next_slot: u64,
    selected: Option<usize>,
}

impl ViewList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    fn take_slot(&mut self) -> Slot {
        if let Some(mut slot) = self.pool.pop() {
            slot.dirty = true;
            return slot;
        }
        let id = SlotId(self.next_slot);
        self.next_slot += 1;
        Slot { id, epoch: 0, view: RowView::default(), dirty: true }
    }

    fn recycle(&mut self, mut slot: Slot) {
        slot.epoch += 1;
        slot.dirty = false;
        self.pool.push(slot);
    }

    /// Rows that must be configured before the next draw, ascending.
    ///
    /// Clears the dirty marks.
    pub fn take_dirty(&mut self) -> Vec<usize> {
        self.rows
            .iter_mut()
            .enumerate()
            .filter_map(|(row, slot)| std::mem::take(&mut slot.dirty).then_some(row))
            .collect()
    }

    /// Whether any row waits to be configured.
    pub fn has_dirty(&self) -> bool {
        self.rows.iter().any(|slot| slot.dirty)
    }

    /// Start reconfiguring `row`: advances the slot's epoch and hands out
    /// its view. `None` if the row does not exist.
    pub fn prepare(&mut self, row: usize) -> Option<(SlotStamp, &mut RowView)> {
        let slot = self.rows.get_mut(row)?;
        slot.epoch += 1;
        slot.dirty = false;
        Some((SlotStamp { slot: slot.id, epoch: slot.epoch }, &mut slot.view))
    }

    /// View of a shown slot, if it is still at the stamped epoch.
    pub fn view_at(&mut self, stamp: SlotStamp) -> Option<&mut RowView> {
        self.rows
            .iter_mut()
            .find(|slot| slot.id == stamp.slot && slot.epoch == stamp.epoch)
            .map(|slot| &mut slot.view)
    }

    /// View shown at `row`.
    pub fn view(&self, row: usize) -> Option<&RowView> {
        self.rows.get(row).map(|slot| &slot.view)
    }

    /// Slot shown at `row`.
    pub fn slot(&self, row: usize) -> Option<SlotId> {
        self.rows.get(row).map(|slot| slot.id)
    }

    /// All shown views in row order.
    pub fn views(&self) -> impl Iterator<Item = &RowView> {
        self.rows.iter().map(|slot| &slot.view)
    }

    /// Slots waiting for reuse.
    pub fn pooled(&self) -> usize {
        self.pool.len()
    }
}

impl ListSurface for ViewList {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn reload_all(&mut self, count: usize) {
        let old = std::mem::take(&mut self.rows);
        for slot in old {
            self.recycle(slot);
        }
        for _ in 0..count {
            let slot = self.take_slot();
            self.rows.push(slot);
        }
        if self.selected.is_some_and(|row| row >= count) {
            self.selected = None;
        }
    }

    fn insert_rows(&mut self, rows: Range<usize>) {
        let at = rows.start.min(self.rows.len());
        for offset in 0..rows.len() {
            let slot = self.take_slot();
            self.rows.insert(at + offset, slot);
        }
    }

    fn remove_rows(&mut self, rows: Range<usize>) {
        let end = rows.end.min(self.rows.len());
        let start = rows.start.min(end);
        let removed: Vec<Slot> = self.rows.drain(start..end).collect();
        for slot in removed {
            self.recycle(slot);
        }
        if self.selected.is_some_and(|row| row >= self.rows.len()) {
            self.selected = None;
        }
    }

    fn reload_rows(&mut self, rows: Range<usize>) {
        for slot in self.rows.iter_mut().skip(rows.start).take(rows.len()) {
            slot.dirty = true;
        }
    }

    fn selected_row(&self) -> Option<usize> {
        self.selected
    }

    fn select_row(&mut self, row: Option<usize>) {
        self.selected = row.filter(|row| *row < self.rows.len());
    }
}
