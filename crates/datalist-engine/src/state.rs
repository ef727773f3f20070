// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::columns::ColumnLayout;
use crate::filter::{ActiveFilterSet, FilterValue};
use crate::pagination::PaginationState;
use crate::prefs::{PREFERENCES_VERSION, ViewPreferences};
use crate::selection::Selection;
use crate::sort::{SortPreference, SortState};

/// Pipeline stage of the most recent render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPhase {
    #[default]
    Idle,
    Filtering,
    Sorting,
    Paginating,
    Rendered,
}

impl ViewPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Filtering => "filtering",
            Self::Sorting => "sorting",
            Self::Paginating => "paginating",
            Self::Rendered => "rendered",
        }
    }
}

/// Everything a render depends on besides the collection and the view
/// definition. Transitions consume the state and return the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub search: String,
    pub filters: ActiveFilterSet,
    pub sort: SortState,
    pub page_index: usize,
    pub page_size: usize,
    pub columns: ColumnLayout,
    pub selection: Selection,
}

impl ViewState {
    /// A zero `page_size` is coerced to 1 and logged like any other
    /// pagination input.
    pub fn new(columns: ColumnLayout, filters: ActiveFilterSet, page_size: usize) -> Self {
        let page_size = PaginationState::new(1, page_size, 0).page_size;
        Self {
            search: String::new(),
            filters,
            sort: SortState::Unsorted,
            page_index: 1,
            page_size,
            columns,
            selection: Selection::new(),
        }
    }

    /// A new query returns to the first page.
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self.page_index = 1;
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: FilterValue) -> Self {
        self.filters.set(name, value);
        self.page_index = 1;
        self
    }

    pub fn without_filter(mut self, name: &str) -> Self {
        self.filters.remove(name);
        self.page_index = 1;
        self
    }

    pub fn with_filters(mut self, filters: ActiveFilterSet) -> Self {
        self.filters = filters;
        self.page_index = 1;
        self
    }

    pub fn with_sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    /// Moves to `requested`, clamped against `total_count` rows.
    pub fn with_page(mut self, requested: usize, total_count: usize) -> Self {
        self.page_index = PaginationState::new(requested, self.page_size, total_count).page_index;
        self
    }

    /// Changes the page size and re-clamps the current page.
    pub fn with_page_size(mut self, page_size: usize, total_count: usize) -> Self {
        let pagination = PaginationState::new(self.page_index, page_size, total_count);
        self.page_size = pagination.page_size;
        self.page_index = pagination.page_index;
        self
    }

    pub fn with_columns(mut self, columns: ColumnLayout) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn pagination(&self, total_count: usize) -> PaginationState {
        PaginationState::new(self.page_index, self.page_size, total_count)
    }

    pub fn preferences(&self) -> ViewPreferences {
        ViewPreferences {
            version: PREFERENCES_VERSION,
            visible_column_ids: self.columns.visible_ids(),
            column_order: self.columns.order().to_vec(),
            page_size: self.page_size,
            sort: SortPreference::from(&self.sort),
        }
    }
}
