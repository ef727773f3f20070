// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Column order and visibility.
//!
//! One order covers the whole catalog, visible and hidden columns alike.
//! The visible columns are always derived from that order filtered by the
//! current selection, so they can never fall out of step with it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::EngineError;
use crate::ids::ColumnId;
use crate::model::{ColumnCatalog, ColumnDef};

/// A drag-and-drop reorder event. `revision` is the layout revision the
/// host observed when the drag started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMove {
    pub moved: ColumnId,
    pub target: ColumnId,
    pub revision: u64,
}

/// Removes `moved` from its slot and reinserts it at the index `target`
/// held. Unknown ids, or `moved == target`, return the order unchanged.
pub fn reorder(order: &[ColumnId], moved: &ColumnId, target: &ColumnId) -> Vec<ColumnId> {
    let mut next = order.to_vec();
    let (Some(from), Some(to)) = (
        order.iter().position(|id| id == moved),
        order.iter().position(|id| id == target),
    ) else {
        return next;
    };
    if from == to {
        return next;
    }
    let column = next.remove(from);
    next.insert(to, column);
    next
}

/// First-load order: the selected columns in selection order, then every
/// remaining catalog column in catalog order.
pub fn initial_order(catalog: &ColumnCatalog, selected: &[ColumnId]) -> Vec<ColumnId> {
    let mut order: Vec<ColumnId> = Vec::with_capacity(catalog.len());
    for id in selected {
        if catalog.contains(id) && !order.contains(id) {
            order.push(id.clone());
        }
    }
    for column in catalog.iter() {
        if !order.contains(&column.id) {
            order.push(column.id.clone());
        }
    }
    order
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    order: Vec<ColumnId>,
    selected: BTreeSet<ColumnId>,
    revision: u64,
}

impl ColumnLayout {
    /// Ids missing from the catalog are dropped from `initial_visible`.
    pub fn new(catalog: &ColumnCatalog, initial_visible: &[ColumnId]) -> Self {
        let selected = initial_visible
            .iter()
            .filter(|id| {
                let known = catalog.contains(id);
                if !known {
                    tracing::debug!(column = %id, "initial visible column not in catalog");
                }
                known
            })
            .cloned()
            .collect();
        Self {
            order: initial_order(catalog, initial_visible),
            selected,
            revision: 0,
        }
    }

    pub fn all_visible(catalog: &ColumnCatalog) -> Self {
        Self::new(catalog, &catalog.ids())
    }

    /// Replaces this layout with a stored order and visible set. Repeated
    /// and unknown ids are dropped, and the order is completed with any
    /// catalog columns it lacks, in catalog order. The revision moves past
    /// the current one so moves captured before the restore go stale.
    pub fn restore(
        &self,
        catalog: &ColumnCatalog,
        order: &[ColumnId],
        visible: &[ColumnId],
    ) -> Self {
        let mut seen = BTreeSet::new();
        let mut restored: Vec<ColumnId> = order
            .iter()
            .filter(|id| catalog.contains(id) && seen.insert(*id))
            .cloned()
            .collect();
        for column in catalog.iter() {
            if !restored.contains(&column.id) {
                restored.push(column.id.clone());
            }
        }
        Self {
            order: restored,
            selected: visible
                .iter()
                .filter(|id| catalog.contains(id))
                .cloned()
                .collect(),
            revision: self.revision + 1,
        }
    }

    pub fn order(&self) -> &[ColumnId] {
        &self.order
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_visible(&self, id: &ColumnId) -> bool {
        self.selected.contains(id)
    }

    pub fn visible_ids(&self) -> Vec<ColumnId> {
        self.order
            .iter()
            .filter(|id| self.selected.contains(*id))
            .cloned()
            .collect()
    }

    pub fn visible_columns<'c>(&self, catalog: &'c ColumnCatalog) -> Vec<&'c ColumnDef> {
        self.order
            .iter()
            .filter(|id| self.selected.contains(*id))
            .filter_map(|id| catalog.get(id))
            .collect()
    }

    pub fn all_selected(&self) -> bool {
        self.order.iter().all(|id| self.selected.contains(id))
    }

    /// Applies a drag event, ignoring it when its revision is stale (a
    /// duplicate callback or a drag that began before another change).
    pub fn apply_move(&mut self, event: &ColumnMove) -> Result<bool, EngineError> {
        if event.revision != self.revision {
            return Err(EngineError::StaleColumnMove {
                event_revision: event.revision,
                current_revision: self.revision,
            });
        }
        self.move_column(&event.moved, &event.target)
    }

    /// Returns whether the order changed.
    pub fn move_column(
        &mut self,
        moved: &ColumnId,
        target: &ColumnId,
    ) -> Result<bool, EngineError> {
        for id in [moved, target] {
            if !self.order.contains(id) {
                return Err(EngineError::UnknownColumnId(id.clone()));
            }
        }
        let next = reorder(&self.order, moved, target);
        if next == self.order {
            return Ok(false);
        }
        self.order = next;
        self.revision += 1;
        Ok(true)
    }

    /// Replaces the visible set, keeping the current order. Unknown ids are
    /// skipped and returned.
    pub fn set_visible(&mut self, ids: &[ColumnId]) -> Vec<EngineError> {
        let mut unknown = Vec::new();
        let mut selected = BTreeSet::new();
        for id in ids {
            if self.order.contains(id) {
                selected.insert(id.clone());
            } else {
                unknown.push(EngineError::UnknownColumnId(id.clone()));
            }
        }
        self.selected = selected;
        unknown
    }

    /// Flips one column; returns whether it is now visible.
    pub fn toggle_column(&mut self, id: &ColumnId) -> Result<bool, EngineError> {
        if !self.order.contains(id) {
            return Err(EngineError::UnknownColumnId(id.clone()));
        }
        if self.selected.remove(id) {
            Ok(false)
        } else {
            self.selected.insert(id.clone());
            Ok(true)
        }
    }

    /// Shows every column in the current order.
    pub fn show_all(&mut self) {
        self.selected = self.order.iter().cloned().collect();
    }

    /// Hides every column. The order is kept so a later `show_all`
    /// restores it.
    pub fn hide_all(&mut self) {
        self.selected.clear();
    }

    /// Aligns the layout with a replacement catalog: surviving columns keep
    /// their position and visibility, new columns are appended hidden in
    /// catalog order, removed columns are dropped.
    pub fn reconcile(&self, catalog: &ColumnCatalog) -> Self {
        let mut order: Vec<ColumnId> = self
            .order
            .iter()
            .filter(|id| catalog.contains(id))
            .cloned()
            .collect();
        for column in catalog.iter() {
            if !order.contains(&column.id) {
                order.push(column.id.clone());
            }
        }
        let selected = self
            .selected
            .iter()
            .filter(|id| catalog.contains(id))
            .cloned()
            .collect();
        let revision = if order == self.order {
            self.revision
        } else {
            self.revision + 1
        };
        Self {
            order,
            selected,
            revision,
        }
    }
}
