// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MAX_PAGE_LINKS: usize = 5;
const MIN_PAGE_LINKS: usize = 3;

/// 1-based page position over a known row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
    pub total_count: usize,
}

impl PaginationState {
    /// Builds a state with the page size coerced to at least 1 and the page
    /// clamped into range.
    pub fn new(page_index: usize, page_size: usize, total_count: usize) -> Self {
        let page_size = if page_size == 0 {
            let error = EngineError::InvalidPageSize(page_size);
            tracing::warn!(%error, "coercing page size to 1");
            1
        } else {
            page_size
        };
        let mut state = Self {
            page_index,
            page_size,
            total_count,
        };
        state.page_index = state.clamp_page(page_index);
        state
    }

    /// Never less than 1, so an empty collection still has one (empty) page.
    pub fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size.max(1)).max(1)
    }

    pub fn clamp_page(&self, requested: usize) -> usize {
        let total_pages = self.total_pages();
        let clamped = requested.clamp(1, total_pages);
        if clamped != requested {
            let error = EngineError::OutOfRangePage {
                requested,
                total_pages,
            };
            tracing::debug!(%error, clamped, "clamping page");
        }
        clamped
    }

    pub fn with_page(self, requested: usize) -> Self {
        Self::new(requested, self.page_size, self.total_count)
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        Self::new(self.page_index, page_size, self.total_count)
    }

    pub fn with_total_count(self, total_count: usize) -> Self {
        Self::new(self.page_index, self.page_size, total_count)
    }

    pub fn next(self) -> Self {
        self.with_page(self.page_index.saturating_add(1))
    }

    pub fn previous(self) -> Self {
        self.with_page(self.page_index.saturating_sub(1))
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 1
    }

    /// Zero-based half-open row range of the current page.
    pub fn row_range(&self) -> std::ops::Range<usize> {
        let start = self
            .page_index
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(self.total_count);
        let end = start.saturating_add(self.page_size).min(self.total_count);
        start..end
    }

    /// 1-based first and last row numbers for "showing x–y of n" captions;
    /// `(0, 0)` when there are no rows.
    pub fn row_span(&self) -> (usize, usize) {
        let range = self.row_range();
        if range.is_empty() {
            (0, 0)
        } else {
            (range.start + 1, range.end)
        }
    }
}

/// Rows of page `page_index` (1-based). Pages past the end, and page 0,
/// yield an empty slice.
pub fn slice<T>(items: &[T], page_index: usize, page_size: usize) -> &[T] {
    if page_index == 0 || page_size == 0 {
        return &[];
    }
    let start = (page_index - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Page links for navigation UI.
///
/// With `max_visible` links (5 by default): every page when they all fit;
/// near the start, pages `1..max_visible-1`, an ellipsis and the last page;
/// near the end, page 1, an ellipsis and the last `max_visible-1` pages;
/// otherwise page 1, an ellipsis, `max_visible-2` pages centred on the
/// current one, an ellipsis and the last page.
pub fn page_window(page_index: usize, total_pages: usize, max_visible: usize) -> Vec<PageLink> {
    let total_pages = total_pages.max(1);
    let max_visible = max_visible.max(MIN_PAGE_LINKS);
    let current = page_index.clamp(1, total_pages);

    if total_pages <= max_visible {
        return (1..=total_pages).map(PageLink::Page).collect();
    }

    let edge_run = max_visible - 1;
    let middle_run = max_visible - 2;

    if current <= middle_run {
        let mut links: Vec<PageLink> = (1..=edge_run).map(PageLink::Page).collect();
        links.push(PageLink::Ellipsis);
        links.push(PageLink::Page(total_pages));
        return links;
    }

    if current + (max_visible - 3) >= total_pages {
        let mut links = vec![PageLink::Page(1), PageLink::Ellipsis];
        links.extend((total_pages + 1 - edge_run..=total_pages).map(PageLink::Page));
        return links;
    }

    let before = (middle_run - 1) / 2;
    let start = current - before;
    let end = start + middle_run - 1;
    let mut links = vec![PageLink::Page(1), PageLink::Ellipsis];
    links.extend((start..=end).map(PageLink::Page));
    links.push(PageLink::Ellipsis);
    links.push(PageLink::Page(total_pages));
    links
}
