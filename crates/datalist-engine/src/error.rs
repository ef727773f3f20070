// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Recoverable engine faults.
//!
//! Nothing in the view pipeline is fatal. Each variant names a condition the
//! engine recovers from locally (ignore the constraint, clamp the page, leave
//! the order untouched) and then reports as a value so hosts and tests can
//! observe what happened.

use thiserror::Error;

use crate::ids::{ActionId, ColumnId, RowId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A filter value has the wrong shape for its declared kind.
    #[error("invalid value {value:?} for {kind} filter `{filter}`")]
    InvalidFilterValue {
        filter: String,
        kind: &'static str,
        value: String,
    },

    /// An active filter entry has no matching filter model.
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),

    /// A requested page lies outside `[1, total_pages]`.
    #[error("page {requested} is outside 1..={total_pages}")]
    OutOfRangePage {
        requested: usize,
        total_pages: usize,
    },

    #[error("page size must be positive, got {0}")]
    InvalidPageSize(usize),

    /// A reorder, visibility, or sort operation named a column the catalog
    /// does not contain.
    #[error("unknown column `{0}`")]
    UnknownColumnId(ColumnId),

    #[error("column `{0}` is not sortable")]
    ColumnNotSortable(ColumnId),

    #[error("duplicate column id `{0}` in catalog")]
    DuplicateColumnId(ColumnId),

    /// Selected rows that no longer exist in the collection.
    #[error("{} selected row(s) no longer exist", .0.len())]
    StaleSelection(Vec<RowId>),

    /// A column move captured against an older layout revision.
    #[error("column move from revision {event_revision} ignored at revision {current_revision}")]
    StaleColumnMove {
        event_revision: u64,
        current_revision: u64,
    },

    #[error("unknown smart sort preset `{0}`")]
    UnknownSortPreset(String),

    #[error("action `{0}` is hidden or disabled")]
    ActionNotEligible(ActionId),
}
