// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The view orchestrator.
//!
//! [`ViewEngine`] owns the collection, the declarative [`ViewDefinition`] and
//! the current [`ViewState`]. Commands change the state and report what
//! changed as events; [`ViewEngine::render`] recomputes every derived value
//! (filtered rows, order, page slice, page window) from scratch, walking
//! `Idle → Filtering → Sorting → Paginating → Rendered`.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use crate::actions::{
    BatchAction, RowAction, eligible_actions, eligible_batch_actions, visible_actions,
    visible_batch_actions,
};
use crate::columns::{ColumnLayout, ColumnMove};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::filter::{ActiveFilterSet, FilterEngine, FilterValue, RowPredicate};
use crate::ids::{ActionId, ColumnId, RowId};
use crate::model::{ColumnCatalog, ColumnDef, Row, SortDirection};
use crate::pagination::{
    DEFAULT_MAX_PAGE_LINKS, DEFAULT_PAGE_SIZE, PageLink, PaginationState, page_window,
};
use crate::prefs::ViewPreferences;
use crate::selection::Selection;
use crate::sort::{SmartSort, SortPreference, SortState, sort_rows, toggle_sort};
use crate::state::{ViewPhase, ViewState};

/// Caller declarations for one list screen.
pub struct ViewDefinition<R> {
    pub catalog: ColumnCatalog,
    pub filters: FilterEngine,
    pub row_actions: Vec<RowAction<R>>,
    pub batch_actions: Vec<BatchAction<R>>,
    pub initial_visible: Option<Vec<ColumnId>>,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    pub max_page_links: usize,
    presets: BTreeMap<String, SmartSort>,
    unmapped_rank: Option<i64>,
}

impl<R> ViewDefinition<R> {
    pub fn new(catalog: ColumnCatalog, filters: FilterEngine) -> Self {
        Self {
            catalog,
            filters,
            row_actions: Vec::new(),
            batch_actions: Vec::new(),
            initial_visible: None,
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: vec![DEFAULT_PAGE_SIZE],
            max_page_links: DEFAULT_MAX_PAGE_LINKS,
            presets: BTreeMap::new(),
            unmapped_rank: None,
        }
    }

    /// Applies pagination, sentinel and sink-rank settings.
    pub fn configure(mut self, config: &EngineConfig) -> Self {
        self.page_size = config.page_size();
        self.page_size_options = config.page_size_options();
        self.max_page_links = config.max_page_links();
        self.filters = self.filters.with_all_sentinel(config.all_sentinel());
        let rank = config.unmapped_rank();
        self.unmapped_rank = Some(rank);
        self.presets = std::mem::take(&mut self.presets)
            .into_iter()
            .map(|(name, preset)| (name, preset.with_unmapped_rank(rank)))
            .collect();
        self
    }

    /// Initially visible columns, in display order. Without this every
    /// catalog column starts visible.
    pub fn visible_columns<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ColumnId>,
    {
        self.initial_visible = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn max_page_links(mut self, links: usize) -> Self {
        self.max_page_links = links;
        self
    }

    /// Registers a smart sort under its name, replacing any earlier preset
    /// with that name.
    pub fn preset(mut self, preset: SmartSort) -> Self {
        let preset = match self.unmapped_rank {
            Some(rank) => preset.with_unmapped_rank(rank),
            None => preset,
        };
        self.presets.insert(preset.name().to_owned(), preset);
        self
    }

    pub fn row_action(mut self, action: RowAction<R>) -> Self {
        self.row_actions.push(action);
        self
    }

    pub fn batch_action(mut self, action: BatchAction<R>) -> Self {
        self.batch_actions.push(action);
        self
    }

    pub fn smart_sort(&self, name: &str) -> Option<&SmartSort> {
        self.presets.get(name)
    }

    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    SetSearch(String),
    SetFilter { name: String, value: FilterValue },
    ClearFilter(String),
    /// Drops every entry, including defaults.
    ClearFilters,
    /// Back to the filter models' default values.
    ResetFilters,
    ToggleSort(ColumnId),
    SetSort {
        column_id: ColumnId,
        direction: SortDirection,
    },
    ApplySmartSort(String),
    ClearSort,
    GoToPage(usize),
    NextPage,
    PreviousPage,
    SetPageSize(usize),
    MoveColumn(ColumnMove),
    ToggleColumn(ColumnId),
    SetVisibleColumns(Vec<ColumnId>),
    ShowAllColumns,
    HideAllColumns,
    ToggleRow(RowId),
    /// Toggles every row on the current page.
    ToggleAllRows,
    ClearSelection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    SearchChanged(String),
    FilterChanged {
        name: String,
        value: Option<FilterValue>,
    },
    FiltersReset(ActiveFilterSet),
    SortChanged(SortState),
    PageChanged(usize),
    PageSizeChanged(usize),
    ColumnsChanged {
        order: Vec<ColumnId>,
        visible: Vec<ColumnId>,
    },
    SelectionChanged(Vec<RowId>),
    SelectionPruned(Vec<RowId>),
    CollectionReplaced { total: usize },
    CatalogReplaced,
    /// The command was recovered from without (full) effect.
    Ignored(EngineError),
}

/// Everything a renderer needs for one frame.
#[derive(Debug)]
pub struct ViewSnapshot<'a, R> {
    pub page_rows: Vec<&'a R>,
    pub page_window: Vec<PageLink>,
    pub visible_columns: Vec<&'a ColumnDef>,
    pub pagination: PaginationState,
    pub total_count: usize,
    pub filtered_count: usize,
    pub first_row: usize,
    pub last_row: usize,
    pub search: &'a str,
    pub filters: &'a ActiveFilterSet,
    pub active_filter_count: usize,
    pub rejected_filters: Vec<EngineError>,
    pub sort: &'a SortState,
    pub selected_ids: Vec<RowId>,
    pub page_fully_selected: bool,
    pub page_size_options: &'a [usize],
}

impl<R: Row> ViewSnapshot<'_, R> {
    pub fn page_ids(&self) -> Vec<RowId> {
        self.page_rows.iter().map(|row| row.row_id()).collect()
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected_ids.contains(id)
    }
}

pub struct ViewEngine<R> {
    definition: ViewDefinition<R>,
    collection: Vec<R>,
    state: ViewState,
    phase: Cell<ViewPhase>,
}

impl<R: Row> ViewEngine<R> {
    pub fn new(definition: ViewDefinition<R>, collection: Vec<R>) -> Self {
        let columns = match &definition.initial_visible {
            Some(ids) => ColumnLayout::new(&definition.catalog, ids),
            None => ColumnLayout::all_visible(&definition.catalog),
        };
        let filters = ActiveFilterSet::from_defaults(definition.filters.models());
        let state = ViewState::new(columns, filters, definition.page_size);
        let mut engine = Self {
            definition,
            collection,
            state,
            phase: Cell::new(ViewPhase::Idle),
        };
        let count = engine.filtered_count();
        engine.transition(|state| {
            let page = state.page_index;
            state.with_page(page, count)
        });
        engine
    }

    pub fn definition(&self) -> &ViewDefinition<R> {
        &self.definition
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn collection(&self) -> &[R] {
        &self.collection
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase.get()
    }

    pub fn dispatch(&mut self, command: ViewCommand) -> Vec<ViewEvent> {
        self.phase.set(ViewPhase::Idle);
        tracing::trace!(?command, "dispatch");
        match command {
            ViewCommand::SetSearch(query) => self.set_search(query),
            ViewCommand::SetFilter { name, value } => self.set_filter(name, value),
            ViewCommand::ClearFilter(name) => {
                if self.state.filters.get(&name).is_none() {
                    return Vec::new();
                }
                self.with_page_event(|engine| {
                    engine.transition(|state| state.without_filter(&name));
                    vec![ViewEvent::FilterChanged { name, value: None }]
                })
            }
            ViewCommand::ClearFilters => self.replace_filters(ActiveFilterSet::new()),
            ViewCommand::ResetFilters => {
                let defaults = ActiveFilterSet::from_defaults(self.definition.filters.models());
                self.replace_filters(defaults)
            }
            ViewCommand::ToggleSort(column_id) => {
                match toggle_sort(&self.definition.catalog, &self.state.sort, &column_id) {
                    Ok(sort) => self.set_sort(sort),
                    Err(error) => ignored(error),
                }
            }
            ViewCommand::SetSort {
                column_id,
                direction,
            } => match self.check_sortable(&column_id) {
                Ok(()) => self.set_sort(SortState::column(column_id, direction)),
                Err(error) => ignored(error),
            },
            ViewCommand::ApplySmartSort(name) => {
                match self.definition.smart_sort(&name).cloned() {
                    Some(preset) => self.set_sort(SortState::Smart(preset)),
                    None => ignored(EngineError::UnknownSortPreset(name)),
                }
            }
            ViewCommand::ClearSort => self.set_sort(SortState::Unsorted),
            ViewCommand::GoToPage(page) => self.go_to_page(page),
            ViewCommand::NextPage => {
                let page = self.state.page_index.saturating_add(1);
                self.go_to_page(page)
            }
            ViewCommand::PreviousPage => {
                let page = self.state.page_index.saturating_sub(1).max(1);
                self.go_to_page(page)
            }
            ViewCommand::SetPageSize(size) => self.set_page_size(size),
            ViewCommand::MoveColumn(event) => {
                let mut columns = self.state.columns.clone();
                match columns.apply_move(&event) {
                    Ok(true) => self.set_columns(columns),
                    Ok(false) => Vec::new(),
                    Err(error) => ignored(error),
                }
            }
            ViewCommand::ToggleColumn(column_id) => {
                let mut columns = self.state.columns.clone();
                match columns.toggle_column(&column_id) {
                    Ok(_) => self.set_columns(columns),
                    Err(error) => ignored(error),
                }
            }
            ViewCommand::SetVisibleColumns(ids) => {
                let mut columns = self.state.columns.clone();
                let unknown = columns.set_visible(&ids);
                let mut events: Vec<ViewEvent> = unknown
                    .into_iter()
                    .map(|error| {
                        tracing::debug!(%error, "skipping column");
                        ViewEvent::Ignored(error)
                    })
                    .collect();
                events.extend(self.set_columns(columns));
                events
            }
            ViewCommand::ShowAllColumns => {
                let mut columns = self.state.columns.clone();
                columns.show_all();
                self.set_columns(columns)
            }
            ViewCommand::HideAllColumns => {
                let mut columns = self.state.columns.clone();
                columns.hide_all();
                self.set_columns(columns)
            }
            ViewCommand::ToggleRow(id) => {
                if !self.collection.iter().any(|row| row.row_id() == id) {
                    return ignored(EngineError::StaleSelection(vec![id]));
                }
                let mut selection = self.state.selection.clone();
                selection.toggle(id);
                self.set_selection(selection)
            }
            ViewCommand::ToggleAllRows => {
                let page_ids = self.page_ids();
                let mut selection = self.state.selection.clone();
                selection.toggle_all(page_ids);
                self.set_selection(selection)
            }
            ViewCommand::ClearSelection => self.set_selection(Selection::new()),
        }
    }

    /// Swaps in a new collection, prunes the selection against it and
    /// re-clamps the page.
    pub fn replace_collection(&mut self, rows: Vec<R>) -> Vec<ViewEvent> {
        self.phase.set(ViewPhase::Idle);
        self.collection = rows;
        let mut events = vec![ViewEvent::CollectionReplaced {
            total: self.collection.len(),
        }];

        let present: BTreeSet<RowId> = self.collection.iter().map(Row::row_id).collect();
        let mut selection = self.state.selection.clone();
        let pruned = selection.prune(&present);
        if !pruned.is_empty() {
            self.transition(|state| state.with_selection(selection));
            events.push(ViewEvent::SelectionPruned(pruned));
        }

        events.extend(self.clamp_page());
        events
    }

    /// Swaps in a new catalog. The column layout is reconciled and a sort on
    /// a column that is gone or no longer sortable is dropped.
    pub fn replace_catalog(&mut self, catalog: ColumnCatalog) -> Vec<ViewEvent> {
        self.phase.set(ViewPhase::Idle);
        let columns = self.state.columns.reconcile(&catalog);
        self.definition.catalog = catalog;
        self.transition(|state| state.with_columns(columns));

        let mut events = vec![ViewEvent::CatalogReplaced, self.columns_event()];
        let stale_sort = match &self.state.sort {
            SortState::Column { column_id, .. } => self.check_sortable(column_id).err(),
            _ => None,
        };
        if let Some(error) = stale_sort {
            tracing::debug!(%error, "dropping sort after catalog change");
            events.extend(self.set_sort(SortState::Unsorted));
        }
        events
    }

    /// Applies stored preferences. Unknown columns and presets are skipped
    /// and reported.
    pub fn restore(&mut self, prefs: &ViewPreferences) -> Vec<ViewEvent> {
        self.phase.set(ViewPhase::Idle);
        let mut events: Vec<ViewEvent> = prefs
            .column_order
            .iter()
            .chain(&prefs.visible_column_ids)
            .filter(|id| !self.definition.catalog.contains(id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|id| ViewEvent::Ignored(EngineError::UnknownColumnId(id.clone())))
            .collect();

        let columns = self.state.columns.restore(
            &self.definition.catalog,
            &prefs.column_order,
            &prefs.visible_column_ids,
        );
        self.transition(|state| state.with_columns(columns));
        events.push(self.columns_event());
        events.extend(self.set_page_size(prefs.page_size));

        let sort = match &prefs.sort {
            SortPreference::Unsorted => Ok(SortState::Unsorted),
            SortPreference::Column {
                column_id,
                direction,
            } => self
                .check_sortable(column_id)
                .map(|()| SortState::column(column_id.clone(), *direction)),
            SortPreference::Smart { preset } => self
                .definition
                .smart_sort(preset)
                .cloned()
                .map(SortState::Smart)
                .ok_or_else(|| EngineError::UnknownSortPreset(preset.clone())),
        };
        match sort {
            Ok(sort) => events.extend(self.set_sort(sort)),
            Err(error) => events.extend(ignored(error)),
        }
        events
    }

    /// Recomputes the frame from the current state.
    pub fn render(&self) -> ViewSnapshot<'_, R> {
        self.enter(ViewPhase::Filtering);
        let predicate = self.predicate();
        let mut rows = self.matching_rows(&predicate);
        let filtered_count = rows.len();

        self.enter(ViewPhase::Sorting);
        sort_rows(&mut rows, &self.definition.catalog, &self.state.sort);

        self.enter(ViewPhase::Paginating);
        let pagination = self.state.pagination(filtered_count);
        let page_rows = rows[pagination.row_range()].to_vec();
        let page_window = page_window(
            pagination.page_index,
            pagination.total_pages(),
            self.definition.max_page_links,
        );
        let (first_row, last_row) = pagination.row_span();

        let selection = &self.state.selection;
        let page_fully_selected = !page_rows.is_empty()
            && page_rows
                .iter()
                .all(|row| selection.is_selected(&row.row_id()));

        let snapshot = ViewSnapshot {
            page_rows,
            page_window,
            visible_columns: self.state.columns.visible_columns(&self.definition.catalog),
            pagination,
            total_count: self.collection.len(),
            filtered_count,
            first_row,
            last_row,
            search: &self.state.search,
            filters: &self.state.filters,
            active_filter_count: self
                .state
                .filters
                .active_count(self.definition.filters.all_sentinel()),
            rejected_filters: predicate.rejected().to_vec(),
            sort: &self.state.sort,
            selected_ids: selection.selected().iter().cloned().collect(),
            page_fully_selected,
            page_size_options: &self.definition.page_size_options,
        };
        self.enter(ViewPhase::Rendered);
        snapshot
    }

    pub fn visible_actions(&self, row: &R) -> Vec<&RowAction<R>> {
        visible_actions(row, &self.definition.row_actions)
    }

    pub fn eligible_actions(&self, row: &R) -> Vec<&RowAction<R>> {
        eligible_actions(row, &self.definition.row_actions)
    }

    /// Selected rows in collection order.
    pub fn selected_entities(&self) -> Vec<&R> {
        self.state.selection.selected_entities(&self.collection)
    }

    pub fn visible_batch_actions(&self) -> Vec<&BatchAction<R>> {
        visible_batch_actions(&self.selected_entities(), &self.definition.batch_actions)
    }

    pub fn eligible_batch_actions(&self) -> Vec<&BatchAction<R>> {
        eligible_batch_actions(&self.selected_entities(), &self.definition.batch_actions)
    }

    pub fn invoke_row_action(&self, action_id: &ActionId, row: &R) -> Result<(), EngineError> {
        self.definition
            .row_actions
            .iter()
            .find(|action| &action.id == action_id)
            .ok_or_else(|| EngineError::ActionNotEligible(action_id.clone()))?
            .invoke(row)
    }

    pub fn invoke_batch_action(&self, action_id: &ActionId) -> Result<(), EngineError> {
        self.definition
            .batch_actions
            .iter()
            .find(|action| &action.id == action_id)
            .ok_or_else(|| EngineError::ActionNotEligible(action_id.clone()))?
            .invoke(&self.selected_entities())
    }

    fn enter(&self, phase: ViewPhase) {
        tracing::trace!(phase = phase.as_str(), "render");
        self.phase.set(phase);
    }

    fn transition(&mut self, step: impl FnOnce(ViewState) -> ViewState) {
        self.state = step(self.state.clone());
    }

    /// Runs `change` and appends a `PageChanged` event if it moved the page.
    fn with_page_event(
        &mut self,
        change: impl FnOnce(&mut Self) -> Vec<ViewEvent>,
    ) -> Vec<ViewEvent> {
        let before = self.state.page_index;
        let mut events = change(self);
        if self.state.page_index != before {
            events.push(ViewEvent::PageChanged(self.state.page_index));
        }
        events
    }

    fn predicate(&self) -> RowPredicate {
        self.definition
            .filters
            .compile(&self.state.search, &self.state.filters)
    }

    fn matching_rows(&self, predicate: &RowPredicate) -> Vec<&R> {
        self.collection
            .iter()
            .filter(|row| predicate.matches(*row))
            .collect()
    }

    fn filtered_count(&self) -> usize {
        self.matching_rows(&self.predicate()).len()
    }

    /// Ids on the current page, computed without touching the render phase.
    fn page_ids(&self) -> Vec<RowId> {
        let mut rows = self.matching_rows(&self.predicate());
        sort_rows(&mut rows, &self.definition.catalog, &self.state.sort);
        let pagination = self.state.pagination(rows.len());
        rows[pagination.row_range()]
            .iter()
            .map(|row| row.row_id())
            .collect()
    }

    fn clamp_page(&mut self) -> Vec<ViewEvent> {
        let count = self.filtered_count();
        self.with_page_event(|engine| {
            engine.transition(|state| {
                let page = state.page_index;
                state.with_page(page, count)
            });
            Vec::new()
        })
    }

    fn check_sortable(&self, column_id: &ColumnId) -> Result<(), EngineError> {
        let column = self
            .definition
            .catalog
            .get(column_id)
            .ok_or_else(|| EngineError::UnknownColumnId(column_id.clone()))?;
        if column.enable_sorting {
            Ok(())
        } else {
            Err(EngineError::ColumnNotSortable(column_id.clone()))
        }
    }

    fn set_search(&mut self, query: String) -> Vec<ViewEvent> {
        if query == self.state.search {
            return Vec::new();
        }
        self.with_page_event(|engine| {
            engine.transition(|state| state.with_search(query.clone()));
            vec![ViewEvent::SearchChanged(query)]
        })
    }

    fn set_filter(&mut self, name: String, value: FilterValue) -> Vec<ViewEvent> {
        let rejected = match self.definition.filters.validate(&name, &value) {
            Ok(()) => None,
            Err(error @ EngineError::UnknownFilter(_)) => {
                tracing::debug!(%error, "ignoring filter command");
                return ignored(error);
            }
            Err(error) => {
                tracing::warn!(%error, "filter value will not constrain rows");
                Some(error)
            }
        };
        if self.state.filters.get(&name) == Some(&value) {
            return rejected.map(ignored).unwrap_or_default();
        }
        self.with_page_event(|engine| {
            engine.transition(|state| state.with_filter(name.clone(), value.clone()));
            let mut events = vec![ViewEvent::FilterChanged {
                name,
                value: Some(value),
            }];
            events.extend(rejected.map(ViewEvent::Ignored));
            events
        })
    }

    fn replace_filters(&mut self, filters: ActiveFilterSet) -> Vec<ViewEvent> {
        if self.state.filters == filters {
            return Vec::new();
        }
        self.with_page_event(|engine| {
            engine.transition(|state| state.with_filters(filters.clone()));
            vec![ViewEvent::FiltersReset(filters)]
        })
    }

    fn set_sort(&mut self, sort: SortState) -> Vec<ViewEvent> {
        if self.state.sort == sort {
            return Vec::new();
        }
        self.transition(|state| state.with_sort(sort.clone()));
        vec![ViewEvent::SortChanged(sort)]
    }

    fn go_to_page(&mut self, requested: usize) -> Vec<ViewEvent> {
        let count = self.filtered_count();
        self.with_page_event(|engine| {
            engine.transition(|state| state.with_page(requested, count));
            Vec::new()
        })
    }

    fn set_page_size(&mut self, size: usize) -> Vec<ViewEvent> {
        let count = self.filtered_count();
        let before = self.state.page_size;
        self.with_page_event(|engine| {
            let mut events = Vec::new();
            if size == 0 {
                events.push(ViewEvent::Ignored(EngineError::InvalidPageSize(size)));
            }
            engine.transition(|state| state.with_page_size(size, count));
            if engine.state.page_size != before {
                events.push(ViewEvent::PageSizeChanged(engine.state.page_size));
            }
            events
        })
    }

    fn set_columns(&mut self, columns: ColumnLayout) -> Vec<ViewEvent> {
        if columns == self.state.columns {
            return Vec::new();
        }
        self.transition(|state| state.with_columns(columns));
        vec![self.columns_event()]
    }

    fn columns_event(&self) -> ViewEvent {
        ViewEvent::ColumnsChanged {
            order: self.state.columns.order().to_vec(),
            visible: self.state.columns.visible_ids(),
        }
    }

    fn set_selection(&mut self, selection: Selection) -> Vec<ViewEvent> {
        if selection == self.state.selection {
            return Vec::new();
        }
        let ids = selection.selected().iter().cloned().collect();
        self.transition(|state| state.with_selection(selection));
        vec![ViewEvent::SelectionChanged(ids)]
    }
}

fn ignored(error: EngineError) -> Vec<ViewEvent> {
    tracing::debug!(%error, "command ignored");
    vec![ViewEvent::Ignored(error)]
}

#[cfg(test)]
mod tests {
    use super::{ViewCommand, ViewDefinition, ViewEngine, ViewEvent};
    use crate::actions::{BatchAction, RowAction};
    use crate::columns::ColumnMove;
    use crate::config::EngineConfig;
    use crate::error::EngineError;
    use crate::filter::{FilterEngine, FilterKind, FilterModel, FilterValue};
    use crate::ids::{ActionId, ColumnId, RowId};
    use crate::model::{ColumnCatalog, ColumnDef, ColumnType, Record, Row, SortDirection};
    use crate::pagination::PageLink;
    use crate::sort::{PriorityMap, SmartSort, SortStage, SortState};
    use crate::state::ViewPhase;
    use std::path::Path;

    fn catalog() -> ColumnCatalog {
        ColumnCatalog::new(vec![
            ColumnDef::new("name", "Name", ColumnType::Text),
            ColumnDef::new("dept", "Department", ColumnType::Select),
            ColumnDef::new("status", "Status", ColumnType::Status),
            ColumnDef::new("notes", "Notes", ColumnType::Textarea).sortable(false),
        ])
        .expect("valid catalog")
    }

    fn rows(count: usize) -> Vec<Record> {
        (0..count)
            .map(|index| {
                let dept = if index % 2 == 0 { "Biology" } else { "Physics" };
                Record::new(format!("r{index:02}"))
                    .with("name", format!("Instrument {index:02}"))
                    .with("dept", dept)
                    .with("status", if index % 3 == 0 { "repair" } else { "normal" })
            })
            .collect()
    }

    fn definition() -> ViewDefinition<Record> {
        ViewDefinition::new(
            catalog(),
            FilterEngine::new(
                vec![FilterModel::new("dept", "Department", FilterKind::Select)],
                vec!["name".to_owned()],
            ),
        )
        .visible_columns(["status", "name"])
        .preset(
            SmartSort::new("status-first")
                .then(SortStage::priority(
                    "status",
                    PriorityMap::new([("normal", 1), ("repair", 3)]),
                ))
                .then(SortStage::natural("name")),
        )
    }

    fn engine(count: usize) -> ViewEngine<Record> {
        ViewEngine::new(definition(), rows(count))
    }

    fn ids(rows: &[&Record]) -> Vec<String> {
        rows.iter().map(|row| row.row_id().to_string()).collect()
    }

    #[test]
    fn render_walks_the_pipeline_phases() {
        let mut engine = engine(3);
        assert_eq!(engine.phase(), ViewPhase::Idle);
        let snapshot = engine.render();
        assert_eq!(snapshot.page_rows.len(), 3);
        assert_eq!(engine.phase(), ViewPhase::Rendered);
        engine.dispatch(ViewCommand::SetSearch("01".to_owned()));
        assert_eq!(engine.phase(), ViewPhase::Idle);
    }

    #[test]
    fn every_command_leaves_the_engine_idle() {
        let commands = vec![
            ViewCommand::SetSearch("Instrument".to_owned()),
            ViewCommand::SetFilter {
                name: "dept".to_owned(),
                value: FilterValue::text("Biology"),
            },
            ViewCommand::ClearFilter("dept".to_owned()),
            ViewCommand::ClearFilters,
            ViewCommand::ResetFilters,
            ViewCommand::ToggleSort(ColumnId::from("name")),
            ViewCommand::SetSort {
                column_id: ColumnId::from("dept"),
                direction: SortDirection::Desc,
            },
            ViewCommand::ApplySmartSort("status-first".to_owned()),
            ViewCommand::ClearSort,
            ViewCommand::GoToPage(2),
            ViewCommand::NextPage,
            ViewCommand::PreviousPage,
            ViewCommand::SetPageSize(5),
            ViewCommand::MoveColumn(ColumnMove {
                moved: ColumnId::from("name"),
                target: ColumnId::from("status"),
                revision: 0,
            }),
            ViewCommand::ToggleColumn(ColumnId::from("dept")),
            ViewCommand::SetVisibleColumns(vec![ColumnId::from("name")]),
            ViewCommand::ShowAllColumns,
            ViewCommand::HideAllColumns,
            ViewCommand::ToggleRow(RowId::from("r01")),
            ViewCommand::ToggleAllRows,
            ViewCommand::ClearSelection,
        ];
        let mut engine = engine(25);
        for command in commands {
            engine.render();
            assert_eq!(engine.phase(), ViewPhase::Rendered);
            engine.dispatch(command.clone());
            assert_eq!(engine.phase(), ViewPhase::Idle, "after {command:?}");
        }
    }

    #[test]
    fn first_render_uses_initial_visible_columns() {
        let engine = engine(3);
        let snapshot = engine.render();
        let headers: Vec<&str> = snapshot
            .visible_columns
            .iter()
            .map(|column| column.header.as_str())
            .collect();
        assert_eq!(headers, vec!["Status", "Name"]);
    }

    #[test]
    fn search_resets_page_and_narrows_rows() {
        let mut engine = engine(47);
        engine.dispatch(ViewCommand::GoToPage(4));
        assert_eq!(engine.state().page_index, 4);

        let events = engine.dispatch(ViewCommand::SetSearch("instrument 1".to_owned()));
        assert_eq!(
            events,
            vec![
                ViewEvent::SearchChanged("instrument 1".to_owned()),
                ViewEvent::PageChanged(1),
            ]
        );
        assert_eq!(engine.render().filtered_count, 10);
        assert!(engine.dispatch(ViewCommand::SetSearch("instrument 1".to_owned())).is_empty());
    }

    #[test]
    fn pages_clamp_and_window_follows() {
        let mut engine = engine(100);
        engine.dispatch(ViewCommand::GoToPage(99));
        let snapshot = engine.render();
        assert_eq!(snapshot.pagination.page_index, 10);
        assert_eq!(
            snapshot.page_window,
            vec![
                PageLink::Page(1),
                PageLink::Ellipsis,
                PageLink::Page(7),
                PageLink::Page(8),
                PageLink::Page(9),
                PageLink::Page(10),
            ]
        );
        assert_eq!((snapshot.first_row, snapshot.last_row), (91, 100));

        let events = engine.dispatch(ViewCommand::NextPage);
        assert!(events.is_empty());
        engine.dispatch(ViewCommand::PreviousPage);
        assert_eq!(engine.state().page_index, 9);
    }

    #[test]
    fn page_size_change_reclamps() {
        let mut engine = engine(47);
        engine.dispatch(ViewCommand::GoToPage(5));
        let events = engine.dispatch(ViewCommand::SetPageSize(25));
        assert_eq!(
            events,
            vec![ViewEvent::PageSizeChanged(25), ViewEvent::PageChanged(2)]
        );
        let zero = engine.dispatch(ViewCommand::SetPageSize(0));
        assert_eq!(zero[0], ViewEvent::Ignored(EngineError::InvalidPageSize(0)));
        assert_eq!(engine.state().page_size, 1);
    }

    #[test]
    fn unknown_filter_and_column_commands_are_ignored() {
        let mut engine = engine(5);
        let before = engine.state().clone();
        assert_eq!(
            engine.dispatch(ViewCommand::SetFilter {
                name: "owner".to_owned(),
                value: FilterValue::text("x"),
            }),
            vec![ViewEvent::Ignored(EngineError::UnknownFilter("owner".to_owned()))]
        );
        assert_eq!(
            engine.dispatch(ViewCommand::ToggleColumn(ColumnId::from("ghost"))),
            vec![ViewEvent::Ignored(EngineError::UnknownColumnId(
                ColumnId::from("ghost")
            ))]
        );
        assert_eq!(
            engine.dispatch(ViewCommand::ToggleSort(ColumnId::from("notes"))),
            vec![ViewEvent::Ignored(EngineError::ColumnNotSortable(
                ColumnId::from("notes")
            ))]
        );
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn malformed_filter_is_kept_but_does_not_constrain() {
        let definition = ViewDefinition::new(
            catalog(),
            FilterEngine::new(
                vec![FilterModel::new("price", "Price", FilterKind::Number)],
                Vec::new(),
            ),
        );
        let mut engine = ViewEngine::new(definition, rows(4));
        let events = engine.dispatch(ViewCommand::SetFilter {
            name: "price".to_owned(),
            value: FilterValue::text("cheap"),
        });
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], ViewEvent::Ignored(EngineError::InvalidFilterValue { .. })));
        let snapshot = engine.render();
        assert_eq!(snapshot.filtered_count, 4);
        assert_eq!(snapshot.rejected_filters.len(), 1);
    }

    #[test]
    fn toggle_sort_cycles_through_dispatch() {
        let mut engine = engine(3);
        let name = ColumnId::from("name");
        engine.dispatch(ViewCommand::ToggleSort(name.clone()));
        assert_eq!(engine.state().sort, SortState::column("name", SortDirection::Asc));
        engine.dispatch(ViewCommand::ToggleSort(name.clone()));
        assert_eq!(engine.state().sort, SortState::column("name", SortDirection::Desc));
        let events = engine.dispatch(ViewCommand::ToggleSort(name));
        assert_eq!(events, vec![ViewEvent::SortChanged(SortState::Unsorted)]);
    }

    #[test]
    fn smart_sort_orders_by_priority_then_name() {
        let mut engine = engine(6);
        engine.dispatch(ViewCommand::ApplySmartSort("status-first".to_owned()));
        let snapshot = engine.render();
        assert_eq!(
            ids(&snapshot.page_rows),
            vec!["r01", "r02", "r04", "r05", "r00", "r03"]
        );
        assert_eq!(
            engine.dispatch(ViewCommand::ApplySmartSort("nope".to_owned())),
            vec![ViewEvent::Ignored(EngineError::UnknownSortPreset("nope".to_owned()))]
        );
    }

    #[test]
    fn duplicate_column_move_applies_once() {
        let mut engine = engine(3);
        let event = ColumnMove {
            moved: ColumnId::from("dept"),
            target: ColumnId::from("status"),
            revision: engine.state().columns.revision(),
        };
        let first = engine.dispatch(ViewCommand::MoveColumn(event.clone()));
        assert_eq!(first.len(), 1);
        let after_first = engine.state().clone();
        let second = engine.dispatch(ViewCommand::MoveColumn(event));
        assert!(matches!(
            second.as_slice(),
            [ViewEvent::Ignored(EngineError::StaleColumnMove { .. })]
        ));
        assert_eq!(engine.state(), &after_first);
        assert_eq!(
            engine.state().columns.visible_ids(),
            vec![ColumnId::from("status"), ColumnId::from("name")]
        );
    }

    #[test]
    fn select_all_toggles_current_page() {
        let mut engine = engine(15);
        engine.dispatch(ViewCommand::ToggleAllRows);
        let snapshot = engine.render();
        assert_eq!(snapshot.selected_ids.len(), 10);
        assert!(snapshot.page_fully_selected);

        engine.dispatch(ViewCommand::ToggleAllRows);
        assert!(engine.render().selected_ids.is_empty());
    }

    #[test]
    fn replacing_collection_prunes_selection() {
        let mut engine = engine(3);
        for id in ["r00", "r01", "r02"] {
            engine.dispatch(ViewCommand::ToggleRow(RowId::from(id)));
        }
        let kept: Vec<Record> = rows(3)
            .into_iter()
            .filter(|row| row.id.as_str() != "r01")
            .collect();
        let events = engine.replace_collection(kept);
        assert_eq!(
            events,
            vec![
                ViewEvent::CollectionReplaced { total: 2 },
                ViewEvent::SelectionPruned(vec![RowId::from("r01")]),
            ]
        );
        assert_eq!(ids(&engine.selected_entities()), vec!["r00", "r02"]);
    }

    #[test]
    fn toggling_missing_row_is_ignored() {
        let mut engine = engine(2);
        assert_eq!(
            engine.dispatch(ViewCommand::ToggleRow(RowId::from("gone"))),
            vec![ViewEvent::Ignored(EngineError::StaleSelection(vec![
                RowId::from("gone")
            ]))]
        );
    }

    #[test]
    fn replacing_catalog_drops_sort_on_removed_column() {
        let mut engine = engine(3);
        engine.dispatch(ViewCommand::ToggleSort(ColumnId::from("dept")));
        let replacement = ColumnCatalog::new(vec![
            ColumnDef::new("name", "Name", ColumnType::Text),
            ColumnDef::new("status", "Status", ColumnType::Status),
            ColumnDef::new("owner", "Owner", ColumnType::User),
        ])
        .expect("valid catalog");
        let events = engine.replace_catalog(replacement);
        assert_eq!(events[0], ViewEvent::CatalogReplaced);
        assert_eq!(
            events.last(),
            Some(&ViewEvent::SortChanged(SortState::Unsorted))
        );
        assert_eq!(
            engine.state().columns.order(),
            &[
                ColumnId::from("status"),
                ColumnId::from("name"),
                ColumnId::from("owner")
            ]
        );
    }

    #[test]
    fn preferences_round_trip_through_restore() {
        let mut source = engine(30);
        source.dispatch(ViewCommand::ShowAllColumns);
        source.dispatch(ViewCommand::ToggleColumn(ColumnId::from("notes")));
        source.dispatch(ViewCommand::SetPageSize(20));
        source.dispatch(ViewCommand::ApplySmartSort("status-first".to_owned()));
        let prefs = source.state().preferences();

        let mut target = engine(30);
        target.restore(&prefs);
        assert_eq!(
            target.state().columns.visible_ids(),
            prefs.visible_column_ids
        );
        assert_eq!(target.state().page_size, 20);
        assert_eq!(target.state().sort.smart_name(), Some("status-first"));
    }

    #[test]
    fn restore_reports_unknown_columns_and_presets() {
        let mut engine = engine(3);
        let mut prefs = engine.state().preferences();
        prefs.column_order.push(ColumnId::from("ghost"));
        prefs.sort = crate::sort::SortPreference::Smart {
            preset: "retired".to_owned(),
        };
        let events = engine.restore(&prefs);
        assert!(events.contains(&ViewEvent::Ignored(EngineError::UnknownColumnId(
            ColumnId::from("ghost")
        ))));
        assert!(events.contains(&ViewEvent::Ignored(EngineError::UnknownSortPreset(
            "retired".to_owned()
        ))));
        assert_eq!(engine.state().sort, SortState::Unsorted);
    }

    #[test]
    fn configure_applies_config_values() {
        let config = EngineConfig::parse(
            "version = 1\n[pagination]\npage_size = 4\nmax_page_links = 7\n[sort]\nunmapped_rank = 0\n",
            Path::new("inline.toml"),
        )
        .expect("valid config");
        let engine = ViewEngine::new(definition().configure(&config), rows(40));
        let snapshot = engine.render();
        assert_eq!(snapshot.pagination.page_size, 4);
        assert_eq!(snapshot.page_window.len(), 8);
    }

    #[test]
    fn actions_are_filtered_by_guards() {
        let definition = definition()
            .row_action(
                RowAction::new("repair", "Repair", |_: &Record| {})
                    .disabled_when(|row: &Record| row.get("status").display() == "repair"),
            )
            .batch_action(
                BatchAction::new("export", "Export", |_: &[&Record]| {})
                    .hidden_when(|selected: &[&Record]| selected.len() > 2),
            );
        let mut engine = ViewEngine::new(definition, rows(4));
        let repair_row = engine.collection()[0].clone();
        assert!(engine.eligible_actions(&repair_row).is_empty());
        assert_eq!(
            engine.invoke_row_action(&ActionId::from("repair"), &repair_row),
            Err(EngineError::ActionNotEligible(ActionId::from("repair")))
        );

        assert!(engine.eligible_batch_actions().is_empty());
        engine.dispatch(ViewCommand::ToggleRow(RowId::from("r01")));
        assert_eq!(engine.eligible_batch_actions().len(), 1);
        assert!(engine.invoke_batch_action(&ActionId::from("export")).is_ok());
        engine.dispatch(ViewCommand::ToggleAllRows);
        assert!(engine.visible_batch_actions().is_empty());
    }
}
