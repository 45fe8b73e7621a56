use std::collections::BTreeSet;

use crate::{RecordId, StockRecord};

/// Record ids picked for export.
///
/// Ids are opaque; the set may hold ids that are not on the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RecordId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` if absent, removes it otherwise. Returns whether it is
    /// selected afterwards.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Clears the set when every visible id is already selected; otherwise
    /// replaces the set with exactly the visible ids.
    pub fn select_all_visible<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a RecordId>,
    {
        let visible: BTreeSet<RecordId> = visible.into_iter().cloned().collect();
        if !visible.is_empty() && visible.iter().all(|id| self.ids.contains(id)) {
            self.ids.clear();
        } else {
            self.ids = visible;
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    /// True when `visible` is non-empty and fully selected.
    pub fn all_selected<'a, I>(&self, visible: I) -> bool
    where
        I: IntoIterator<Item = &'a RecordId>,
    {
        let mut any = false;
        for id in visible {
            any = true;
            if !self.ids.contains(id) {
                return false;
            }
        }
        any
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }

    /// Selected records of `records`, in their original order.
    pub fn selected_from<'a>(&self, records: &'a [StockRecord]) -> Vec<&'a StockRecord> {
        records
            .iter()
            .filter(|record| self.ids.contains(&record.id))
            .collect()
    }
}
