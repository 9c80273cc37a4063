use shared::protocol::WirePage;

use crate::{mapper::normalize, model::ContentItem, query::QueryState};

/// One fetched page plus the pagination metadata that came with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub items: Vec<ContentItem>,
    pub page_index: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PageResult {
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page_index: 0,
            page_size: page_size.max(1),
            total_items: 0,
            total_pages: 1,
        }
    }

    /// Missing metadata falls back to what was requested, and the page count
    /// is derived from the item total.
    pub fn from_wire(page: WirePage, requested: &QueryState) -> Self {
        let page_size = page.size.filter(|s| *s > 0).unwrap_or(requested.page_size());
        let total_items = page.total_elements.unwrap_or(0);
        let page_index = page.number.unwrap_or(requested.page_index());
        let total_pages = page
            .total_pages
            .unwrap_or_else(|| derive_total_pages(total_items, page_size));

        Self {
            items: page.content.into_iter().map(normalize).collect(),
            page_index,
            page_size,
            total_items,
            total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: shared::domain::ContentId) -> Option<&ContentItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

pub fn derive_total_pages(total_items: u64, page_size: u32) -> u32 {
    let pages = total_items.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Holds the last successfully fetched page. Swapped whole, never merged.
#[derive(Debug, Clone)]
pub struct PageCache {
    current: PageResult,
}

impl PageCache {
    pub fn new(page_size: u32) -> Self {
        Self {
            current: PageResult::empty(page_size),
        }
    }

    pub fn replace(&mut self, page: PageResult) -> PageResult {
        std::mem::replace(&mut self.current, page)
    }

    pub fn current(&self) -> &PageResult {
        &self.current
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
