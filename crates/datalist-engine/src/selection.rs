// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::EngineError;
use crate::ids::RowId;
use crate::model::Row;

/// Selected row identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: BTreeSet<RowId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the row is selected afterwards.
    pub fn toggle(&mut self, id: RowId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Selects exactly `in_view`, or clears when the selection already equals
    /// it. Returns whether anything is selected afterwards.
    pub fn toggle_all<I>(&mut self, in_view: I) -> bool
    where
        I: IntoIterator<Item = RowId>,
    {
        let in_view: BTreeSet<RowId> = in_view.into_iter().collect();
        if in_view.is_empty() || self.ids == in_view {
            self.ids.clear();
            false
        } else {
            self.ids = in_view;
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn selected(&self) -> &BTreeSet<RowId> {
        &self.ids
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drops ids not in `present` and returns them, sorted.
    pub fn prune(&mut self, present: &BTreeSet<RowId>) -> Vec<RowId> {
        let stale: Vec<RowId> = self
            .ids
            .iter()
            .filter(|id| !present.contains(*id))
            .cloned()
            .collect();
        if !stale.is_empty() {
            let error = EngineError::StaleSelection(stale.clone());
            tracing::debug!(%error, "pruning selection");
            for id in &stale {
                self.ids.remove(id);
            }
        }
        stale
    }

    /// Selected rows in collection order. Ids without a row are skipped.
    pub fn selected_entities<'r, R: Row>(&self, collection: &'r [R]) -> Vec<&'r R> {
        collection
            .iter()
            .filter(|row| self.ids.contains(&row.row_id()))
            .collect()
    }
}

impl FromIterator<RowId> for Selection {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Selection;
    use crate::ids::RowId;
    use crate::model::{Record, Row};
    use std::collections::BTreeSet;

    fn ids(values: &[&str]) -> Vec<RowId> {
        values.iter().copied().map(RowId::from).collect()
    }

    #[test]
    fn toggle_flips_membership() {
        let mut selection = Selection::new();
        assert!(selection.toggle(RowId::from("a")));
        assert!(selection.is_selected(&RowId::from("a")));
        assert!(!selection.toggle(RowId::from("a")));
        assert!(selection.is_empty());
    }

    #[test]
    fn toggle_all_is_a_true_toggle() {
        let mut selection = Selection::new();
        selection.toggle(RowId::from("b"));

        assert!(selection.toggle_all(ids(&["a", "b", "c"])));
        assert_eq!(selection.len(), 3);

        assert!(!selection.toggle_all(ids(&["a", "b", "c"])));
        assert!(selection.is_empty());
    }

    #[test]
    fn toggle_all_over_empty_view_clears() {
        let mut selection: Selection = ids(&["a"]).into_iter().collect();
        assert!(!selection.toggle_all(Vec::new()));
        assert!(selection.is_empty());
    }

    #[test]
    fn prune_drops_missing_rows() {
        let mut selection: Selection = ids(&["A", "B", "C"]).into_iter().collect();
        let present: BTreeSet<RowId> = ids(&["A", "C", "D"]).into_iter().collect();
        assert_eq!(selection.prune(&present), ids(&["B"]));
        assert_eq!(
            selection.selected().iter().cloned().collect::<Vec<_>>(),
            ids(&["A", "C"])
        );
        assert!(selection.prune(&present).is_empty());
    }

    #[test]
    fn selected_entities_follow_collection_order() {
        let selection: Selection = ids(&["c", "a", "ghost"]).into_iter().collect();
        let rows = vec![Record::new("a"), Record::new("b"), Record::new("c")];
        let picked: Vec<String> = selection
            .selected_entities(&rows)
            .iter()
            .map(|row| row.row_id().to_string())
            .collect();
        assert_eq!(picked, vec!["a", "c"]);
    }
}
