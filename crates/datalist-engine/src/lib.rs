// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Declarative collection view engine: filter, sort, paginate, select and
//! lay out an in-memory collection independently of how rows are drawn.

pub mod actions;
pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod ids;
pub mod model;
pub mod pagination;
pub mod prefs;
pub mod selection;
pub mod sort;
pub mod state;
pub mod validation;

pub use actions::{ActionKind, BatchAction, RowAction};
pub use columns::{ColumnLayout, ColumnMove};
pub use config::EngineConfig;
pub use engine::{ViewCommand, ViewDefinition, ViewEngine, ViewEvent, ViewSnapshot};
pub use error::EngineError;
pub use filter::{ActiveFilterSet, FilterEngine, FilterKind, FilterModel, FilterValue};
pub use ids::*;
pub use model::*;
pub use pagination::{PageLink, PaginationState};
pub use prefs::ViewPreferences;
pub use selection::Selection;
pub use sort::{PriorityMap, SmartSort, SortPreference, SortStage, SortState, ValueComparator};
pub use state::{ViewPhase, ViewState};
